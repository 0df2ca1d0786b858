use auto_pager::SourceKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "auto-pager")]
#[command(about = "Stitches paginated web documents into one, prefetching ahead of the reader")]
#[command(version)]
pub struct Args {
    /// Address of the first page
    pub url: String,

    /// JSON configuration with site rules
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Selector for the content fragments (overrides site rules)
    #[arg(long, requires = "next")]
    pub content: Option<String>,

    /// Selector for the next-page link (overrides site rules)
    #[arg(long, requires = "content")]
    pub next: Option<String>,

    /// Pages to prefetch beyond the furthest page reached
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Network boundary to fetch through
    #[arg(short, long, value_enum)]
    pub source: Option<SourceArg>,

    /// Keep scrolling to the newest page until the chain ends
    #[arg(long)]
    pub read_through: bool,

    /// Stop reading through after this many pages
    #[arg(long, default_value_t = 50)]
    pub max_pages: usize,

    /// Write the stitched HTML here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print a JSON summary of the fetched pages to stderr
    #[arg(long)]
    pub summary: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Http,
    Webdriver,
}

/// Convert from CLI argument source to the library's source kind
pub fn convert_source(arg: SourceArg) -> SourceKind {
    match arg {
        SourceArg::Http => SourceKind::Http,
        SourceArg::Webdriver => SourceKind::Webdriver,
    }
}
