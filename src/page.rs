use crate::document::Fragment;
use crate::locator::NextRef;
use serde::{Deserialize, Serialize};
use url::Url;

/// One virtual page: the located fragments, the link onward, and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    fragments: Vec<Fragment>,
    next_ref: NextRef,
    address: String,
}

impl Page {
    /// Create a page that has not been attached to an address yet
    pub fn new(fragments: Vec<Fragment>, next_ref: NextRef) -> Self {
        Self {
            fragments,
            next_ref,
            address: String::new(),
        }
    }

    /// Attach the address the page was fetched from.
    ///
    /// A relative next link is resolved against that address. Links that
    /// cannot be resolved are kept verbatim and will fail at fetch time.
    pub fn located_at(self, address: impl Into<String>) -> Self {
        let address = address.into();
        let base = address.clone();
        self.located_at_base(address, &base)
    }

    /// Like [`Page::located_at`], but relative links resolve against `base`,
    /// the address the document was served from after redirects.
    pub fn located_at_base(mut self, address: impl Into<String>, base: &str) -> Self {
        self.address = address.into();
        if let NextRef::Address(href) = &self.next_ref {
            match Url::parse(base).and_then(|base| base.join(href)) {
                Ok(resolved) => self.next_ref = NextRef::Address(resolved.to_string()),
                Err(e) => {
                    ::log::debug!("Keeping unresolvable next link {}: {}", href, e);
                }
            }
        }
        self
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn next_ref(&self) -> &NextRef {
        &self.next_ref
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
