use crate::document::Fragment;
use crate::page::Page;
use crate::tracker::Layout;

/// Insertion point: new blocks go right after the element it designates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(usize);

impl Cursor {
    /// Number of blocks that precede the insertion point
    pub fn position(&self) -> usize {
        self.0
    }
}

/// Controls attached to every page boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Leave the paginated document (`history.go(-push_count)`)
    PreviousSite,
    /// Turn auto-pagination off and reload at the page's address
    Toggle,
}

/// Status blocks inserted between pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Boundary {
        index: usize,
        address: String,
        controls: Vec<Control>,
    },
    Ended,
    Error {
        address: String,
        cause: String,
    },
}

impl Marker {
    /// User-facing text of the marker
    pub fn message(&self) -> String {
        match self {
            Marker::Boundary { address, .. } => address.clone(),
            Marker::Ended => "PAGE_ENDED".to_string(),
            Marker::Error { address, .. } => {
                format!("Error while loading {address}. Reload to continue.")
            }
        }
    }
}

/// A unit of the stitched document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Content(Fragment),
    Marker(Marker),
}

impl Block {
    /// Height in lines
    pub fn height(&self) -> f64 {
        match self {
            Block::Content(fragment) => fragment.line_count() as f64,
            Block::Marker(_) => 1.0,
        }
    }
}

/// Presentation boundary the session renders into
pub trait Presenter: Layout {
    /// Where the next page goes
    fn tail(&self) -> Cursor;

    /// Insert a boundary marker, the page's fragments and, when the page is
    /// the last one, an `Ended` marker. Returns the new tail.
    fn render(&mut self, index: usize, page: &Page, cursor: Cursor) -> Cursor;

    /// Insert an error marker. Never fails.
    fn render_error(&mut self, address: &str, cause: &str, cursor: Cursor) -> Cursor;

    /// Record a navigation entry for a virtual page
    fn push_history(&mut self, address: &str, index: usize);

    /// Go back `push_count` history entries, past every page this document
    /// pushed. Returns true when that leaves the document.
    fn previous_site(&mut self, push_count: usize) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub index: usize,
    pub address: String,
}

/// Result of moving through the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation<'a> {
    Entry(&'a HistoryEntry),
    /// Moved past the document's own entry, back to whatever preceded it
    LeftDocument,
}

/// Back/forward history scoped to the paginated document
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    position: usize,
}

impl History {
    /// Start with the document's own entry
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry {
                index: 0,
                address: address.into(),
            }],
            position: 0,
        }
    }

    /// Push an entry, discarding any forward entries like a browser does
    pub fn push(&mut self, address: impl Into<String>, index: usize) {
        self.entries.truncate(self.position + 1);
        self.entries.push(HistoryEntry {
            index,
            address: address.into(),
        });
        self.position = self.entries.len() - 1;
    }

    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.position]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Move `delta` entries; out-of-range forward moves are ignored
    pub fn go(&mut self, delta: isize) -> Option<Navigation<'_>> {
        let target = self.position as isize + delta;
        if target < 0 {
            return Some(Navigation::LeftDocument);
        }
        let target = target as usize;
        if target >= self.entries.len() {
            return None;
        }
        self.position = target;
        Some(Navigation::Entry(&self.entries[target]))
    }
}

/// Headless rendition of the growing document
#[derive(Debug, Clone)]
pub struct StitchedDocument {
    blocks: Vec<Block>,
    anchors: Vec<Option<usize>>,
    history: History,
    left: bool,
}

impl StitchedDocument {
    /// Seed the document with the initial page's own fragments
    pub fn new(initial: &Page) -> Self {
        let blocks: Vec<Block> = initial
            .fragments()
            .iter()
            .cloned()
            .map(Block::Content)
            .collect();
        let anchor = if blocks.is_empty() { None } else { Some(0) };

        Self {
            blocks,
            anchors: vec![anchor],
            history: History::new(initial.address()),
            left: false,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether the previous-site control took the reader out of the document
    pub fn has_left(&self) -> bool {
        self.left
    }

    /// Markers in document order
    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Marker(marker) => Some(marker),
            Block::Content(_) => None,
        })
    }

    /// Document offset of a block
    pub fn block_top(&self, block: usize) -> f64 {
        self.blocks[..block.min(self.blocks.len())]
            .iter()
            .map(Block::height)
            .sum()
    }

    fn insert(&mut self, cursor: Cursor, block: Block) -> Cursor {
        let at = cursor.position().min(self.blocks.len());
        self.blocks.insert(at, block);
        for anchor in self.anchors.iter_mut().flatten() {
            if *anchor >= at {
                *anchor += 1;
            }
        }
        Cursor(at + 1)
    }

    /// Serialize the stitched document as HTML
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n<html>\n<body>\n");
        for block in &self.blocks {
            match block {
                Block::Content(fragment) => out.push_str(&fragment.html),
                Block::Marker(marker) => out.push_str(&marker_html(marker)),
            }
            out.push('\n');
        }
        out.push_str("</body>\n</html>\n");
        out
    }
}

impl Layout for StitchedDocument {
    fn anchor_top(&self, page_index: usize) -> Option<f64> {
        let block = (*self.anchors.get(page_index)?)?;
        Some(self.block_top(block))
    }
}

impl Presenter for StitchedDocument {
    fn tail(&self) -> Cursor {
        Cursor(self.blocks.len())
    }

    fn render(&mut self, index: usize, page: &Page, cursor: Cursor) -> Cursor {
        if self.anchors.len() <= index {
            self.anchors.resize(index + 1, None);
        }

        let boundary = Marker::Boundary {
            index,
            address: page.address().to_string(),
            controls: vec![Control::PreviousSite, Control::Toggle],
        };
        let mut cursor = self.insert(cursor, Block::Marker(boundary));
        self.anchors[index] = Some(cursor.position() - 1);

        for (i, fragment) in page.fragments().iter().enumerate() {
            cursor = self.insert(cursor, Block::Content(fragment.clone()));
            if i == 0 {
                self.anchors[index] = Some(cursor.position() - 1);
            }
        }

        if page.next_ref().is_terminal() {
            cursor = self.insert(cursor, Block::Marker(Marker::Ended));
        }

        ::log::debug!(
            "Rendered page {} ({} fragments) from {}",
            index,
            page.fragments().len(),
            page.address()
        );
        cursor
    }

    fn render_error(&mut self, address: &str, cause: &str, cursor: Cursor) -> Cursor {
        let marker = Marker::Error {
            address: address.to_string(),
            cause: cause.to_string(),
        };
        self.insert(cursor, Block::Marker(marker))
    }

    fn push_history(&mut self, address: &str, index: usize) {
        ::log::trace!("History push {} -> {}", index, address);
        self.history.push(address, index);
    }

    fn previous_site(&mut self, push_count: usize) -> bool {
        let delta = -isize::try_from(push_count).unwrap_or(isize::MAX);
        if let Some(Navigation::LeftDocument) = self.history.go(delta) {
            self.left = true;
        }
        self.left
    }
}

fn marker_html(marker: &Marker) -> String {
    match marker {
        Marker::Boundary {
            index,
            address,
            controls,
        } => {
            let buttons = controls
                .iter()
                .map(|control| match control {
                    Control::PreviousSite => {
                        "<button data-action=\"previous-site\">Go To Previous WebSite</button>"
                    }
                    Control::Toggle => "<button data-action=\"toggle\">Toggle On/Off</button>",
                })
                .collect::<String>();
            let address = escape(address);
            format!(
                "<div class=\"autopager-boundary\" data-page=\"{index}\">{buttons}<a href=\"{address}\">{address}</a></div>"
            )
        }
        Marker::Ended => format!(
            "<div class=\"autopager-ended\">{}</div>",
            escape(&marker.message())
        ),
        Marker::Error { cause, .. } => format!(
            "<div class=\"autopager-error\" title=\"{}\">{}</div>",
            escape(cause),
            escape(&marker.message())
        ),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
