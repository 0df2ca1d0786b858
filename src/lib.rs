//! Infinite scrolling over externally paginated documents.
//!
//! A [`LocatorSpec`] names where a site keeps its content and its "next"
//! link. A [`Session`] extends the starting document with the pages that
//! follow. It prefetches at most a bounded number of pages ahead of the
//! furthest page the reader has reached, and it keeps history entries in
//! step with the page in view.

pub mod config;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod locator;
pub mod page;
pub mod presenter;
pub mod session;
pub mod store;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use config::{PagerConfig, SiteRule, SourceKind};
pub use error::{ConfigurationError, Error, FetchCause, FetchError, LocatorError};
pub use locator::{Locator, LocatorSpec, NextRef};
pub use page::Page;
pub use presenter::StitchedDocument;
pub use session::{Session, SessionReport, ViewportEvent};
pub use store::{Action, Effect, PaginationState, PaginationStore};

use fetcher::{AnySource, Fetcher, HttpSource, WebDriverSource};
use std::path::Path;
use std::time::Duration;

/// Builder for a pagination session
pub struct Pager {
    config: PagerConfig,
}

impl Pager {
    /// Create a new Pager builder for the given start address
    pub fn new(start_url: &str) -> Self {
        Self {
            config: PagerConfig::new(start_url),
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: PagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file, keeping the start address if the file has none
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let config = PagerConfig::from_file(path)?;
        Ok(self.merge(config))
    }

    /// Load configuration from a JSON string
    pub fn with_config_str(self, json: &str) -> Result<Self, ConfigurationError> {
        let config = PagerConfig::from_json(json)?;
        Ok(self.merge(config))
    }

    /// Use this locator for every address
    pub fn with_locator(mut self, locator: LocatorSpec) -> Self {
        self.config = self.config.with_locator(locator);
        self
    }

    /// Set the look-ahead limit
    pub fn with_look_ahead_limit(mut self, limit: usize) -> Self {
        self.config.look_ahead_limit = limit;
        self
    }

    /// Select the network boundary
    pub fn with_source(mut self, source: SourceKind) -> Self {
        self.config.source = source;
        self
    }

    /// Set the viewport height used for page jumps
    pub fn with_viewport_height(mut self, lines: f64) -> Self {
        self.config.viewport_height = lines;
        self
    }

    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    fn merge(mut self, mut config: PagerConfig) -> Self {
        if config.start_url.is_empty() {
            config.start_url = std::mem::take(&mut self.config.start_url);
        }
        self.config = config;
        self
    }

    /// Resolve the locator, build the source and fetch the initial page
    pub async fn open(self) -> Result<Session<AnySource, StitchedDocument>, Error> {
        let mut config = self.config;
        ::log::info!("Opening pagination session for {}", config.start_url);

        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                config.webdriver_url = webdriver_url;
            }
        }

        let spec = config.locator_for(&config.start_url)?;
        let locator = Locator::new(spec)?;

        let source = match config.source {
            SourceKind::Http => {
                let timeout = config.request_timeout_secs.map(Duration::from_secs);
                let http = HttpSource::new(timeout)
                    .map_err(|cause| FetchError::new(config.start_url.clone(), cause))?;
                AnySource::Http(http)
            }
            SourceKind::Webdriver => {
                AnySource::WebDriver(WebDriverSource::new(config.webdriver_url.clone()))
            }
        };

        Session::open(
            Fetcher::new(source, locator),
            &config.start_url,
            config.look_ahead_limit,
            config.viewport_height,
        )
        .await
    }
}
