mod store_scenarios;

use crate::error::FetchCause;
use crate::fetcher::{DocumentSource, Retrieved};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

/// In-memory document source for tests; unknown addresses answer 404
#[derive(Default)]
pub(crate) struct MemorySource {
    pages: HashMap<String, String>,
    broken: HashSet<String>,
    redirects: HashMap<String, String>,
    requests: RefCell<Vec<String>>,
    active: Cell<usize>,
    max_active: Cell<usize>,
}

impl MemorySource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, address: &str, html: &str) -> Self {
        self.pages.insert(address.to_string(), html.to_string());
        self
    }

    /// Serve `count` pages at `{base}/0` .. `{base}/{count-1}`, each linking the next
    pub(crate) fn with_chain(mut self, base: &str, count: usize) -> Self {
        for i in 0..count {
            let link = if i + 1 < count {
                format!(r#"<a class="next" href="/{}">next</a>"#, i + 1)
            } else {
                String::new()
            };
            let html = format!(
                r#"<html><body><div class="item">item {i}</div>{link}</body></html>"#
            );
            self.pages.insert(format!("{base}/{i}"), html);
        }
        self
    }

    /// Fail every fetch of `address` with a network error
    pub(crate) fn with_broken(mut self, address: &str) -> Self {
        self.broken.insert(address.to_string());
        self
    }

    /// Serve `to` whenever `from` is requested
    pub(crate) fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub(crate) fn request_count(&self, address: &str) -> usize {
        self.requests.borrow().iter().filter(|a| *a == address).count()
    }

    /// Highest number of retrievals that were running at the same time
    pub(crate) fn max_active(&self) -> usize {
        self.max_active.get()
    }
}

impl DocumentSource for MemorySource {
    async fn retrieve(&self, address: &str) -> Result<Retrieved, FetchCause> {
        self.requests.borrow_mut().push(address.to_string());
        self.active.set(self.active.get() + 1);
        self.max_active
            .set(self.max_active.get().max(self.active.get()));

        tokio::task::yield_now().await;

        self.active.set(self.active.get() - 1);
        if self.broken.contains(address) {
            return Err(FetchCause::Network("connection reset".to_string()));
        }
        let target = self.redirects.get(address).map_or(address, String::as_str);
        self.pages
            .get(target)
            .map(|body| Retrieved::new(target, body.as_str()))
            .ok_or(FetchCause::Status(404))
    }
}
