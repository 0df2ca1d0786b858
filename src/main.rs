use auto_pager::{LocatorSpec, PaginationState, Pager, ViewportEvent};
use clap::Parser;
use serde::Serialize;
use tokio::sync::mpsc;

mod args;
use args::{Args, convert_source};

/// One line of the `--summary` output
#[derive(Serialize)]
struct PageSummary<'a> {
    index: usize,
    address: &'a str,
    fragments: usize,
    next: &'a auto_pager::NextRef,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    ::log::info!("Starting pager for URL: {}", args.url);

    let mut pager = Pager::new(&args.url);
    if let Some(path) = &args.config {
        pager = match pager.with_config_file(path) {
            Ok(pager) => pager,
            Err(e) => {
                ::log::error!("Failed to load {}: {}", path.display(), e);
                std::process::exit(2);
            }
        };
    }
    if let (Some(content), Some(next)) = (&args.content, &args.next) {
        pager = pager.with_locator(LocatorSpec::new(content.as_str(), next.as_str()));
    }
    if let Some(limit) = args.limit {
        pager = pager.with_look_ahead_limit(limit);
    }
    if let Some(source) = args.source {
        pager = pager.with_source(convert_source(source));
    }

    let mut session = match pager.open().await {
        Ok(session) => session,
        Err(e) => {
            ::log::error!("Failed to start pagination: {}", e);
            std::process::exit(1);
        }
    };

    // The reader: jumps to the newest page whenever the store goes idle,
    // and lets the session end once there is nothing left to do
    let (tx, rx) = mpsc::channel(16);
    let mut reader = Some(tx);
    let read_through = args.read_through;
    let max_pages = args.max_pages;
    let mut requested = 0;
    session.subscribe(move |state: &PaginationState| {
        if state.is_fetching() {
            return;
        }
        let Some(tx) = reader.as_ref() else {
            return;
        };
        let last = state.pages().len().saturating_sub(1);
        // Each page is jumped to once; a jump that did not land ends the reading
        let more = read_through
            && state.current_page_index() < last
            && last > requested
            && last < max_pages;
        if !more || tx.try_send(ViewportEvent::JumpToPage(last)).is_err() {
            reader = None;
        } else {
            requested = last;
        }
    });

    let start_time = std::time::Instant::now();
    let report = session.run(rx).await;

    ::log::info!(
        "Pagination complete - {} pages in {:.2} seconds",
        report.state.pages().len(),
        start_time.elapsed().as_secs_f64()
    );
    if let Some(address) = report.state.suspended_at() {
        ::log::warn!("Stopped after a failure at {}", address);
    }

    if args.summary {
        print_summary(&report.state);
    }

    let html = report.presenter.to_html();
    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, html) {
                ::log::error!("Failed to write {}: {}", path.display(), e);
                std::process::exit(1);
            }
            ::log::info!("Wrote {}", path.display());
        }
        None => print!("{html}"),
    }

    if let auto_pager::fetcher::AnySource::WebDriver(source) = report.source {
        source.close().await;
    }
}

fn print_summary(state: &PaginationState) {
    let pages = state
        .pages()
        .iter()
        .enumerate()
        .map(|(index, page)| PageSummary {
            index,
            address: page.address(),
            fragments: page.fragments().len(),
            next: page.next_ref(),
        })
        .collect::<Vec<_>>();

    match serde_json::to_string_pretty(&pages) {
        Ok(json) => eprintln!("{json}"),
        Err(e) => ::log::error!("Failed to serialize summary: {}", e),
    }
}
