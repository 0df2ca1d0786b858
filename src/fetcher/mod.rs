pub mod http;
pub mod webdriver;

use crate::document::HtmlDocument;
use crate::error::{ConfigurationError, Error, FetchCause, FetchError};
use crate::locator::Locator;
use crate::page::Page;
use std::future::Future;

pub use http::HttpSource;
pub use webdriver::WebDriverSource;

/// Document source text and the address it was finally served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieved {
    /// Address after redirects; relative links resolve against it
    pub final_address: String,
    pub body: String,
}

impl Retrieved {
    pub fn new(final_address: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            final_address: final_address.into(),
            body: body.into(),
        }
    }
}

/// Network boundary: turns an address into document source text
pub trait DocumentSource {
    fn retrieve(&self, address: &str) -> impl Future<Output = Result<Retrieved, FetchCause>>;
}

/// Either of the built-in sources, picked at runtime from configuration
pub enum AnySource {
    Http(HttpSource),
    WebDriver(WebDriverSource),
}

impl DocumentSource for AnySource {
    async fn retrieve(&self, address: &str) -> Result<Retrieved, FetchCause> {
        match self {
            AnySource::Http(source) => source.retrieve(address).await,
            AnySource::WebDriver(source) => source.retrieve(address).await,
        }
    }
}

/// Retrieves, parses and locates remote pages
pub struct Fetcher<S> {
    source: S,
    locator: Locator,
}

impl<S: DocumentSource> Fetcher<S> {
    pub fn new(source: S, locator: Locator) -> Self {
        Self { source, locator }
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Fetch one page. Every failure is reported as a single [`FetchError`].
    pub async fn fetch_page(&self, address: String) -> Result<Page, FetchError> {
        let start = std::time::Instant::now();
        ::log::debug!("FETCH: {}", address);

        let retrieved = match self.source.retrieve(&address).await {
            Ok(retrieved) => retrieved,
            Err(cause) => return Err(FetchError::new(address, cause)),
        };

        let page = match self.locate(&retrieved.body) {
            Ok(page) => page.located_at_base(address, &retrieved.final_address),
            Err(cause) => return Err(FetchError::new(address, cause)),
        };

        ::log::debug!(
            "Fetched {} in {:.2} seconds",
            page.address(),
            start.elapsed().as_secs_f64()
        );
        Ok(page)
    }

    /// Fetch the document the session starts from; it must have content
    pub async fn fetch_initial(&self, address: &str) -> Result<Page, Error> {
        let page = self.fetch_page(address.to_string()).await?;
        if page.is_empty() {
            return Err(ConfigurationError::EmptyInitialPage {
                address: address.to_string(),
            }
            .into());
        }
        Ok(page)
    }

    // The parsed document is not Send, so it never lives across an await
    fn locate(&self, source: &str) -> Result<Page, FetchCause> {
        let document = HtmlDocument::parse(source);
        Ok(self.locator.parse(&document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{LocatorSpec, NextRef};
    use crate::tests::MemorySource;

    fn fetcher(source: MemorySource) -> Fetcher<MemorySource> {
        let locator = Locator::new(LocatorSpec::new("div.item", "a.next")).unwrap();
        Fetcher::new(source, locator)
    }

    #[tokio::test]
    async fn test_fetch_page_attaches_address() {
        let source = MemorySource::new().with_page(
            "https://example.com/list/1",
            r#"<div class="item">one</div><a class="next" href="2">next</a>"#,
        );
        let page = fetcher(source)
            .fetch_page("https://example.com/list/1".to_string())
            .await
            .unwrap();
        assert_eq!(page.address(), "https://example.com/list/1");
        assert_eq!(page.fragments().len(), 1);
        assert_eq!(
            page.next_ref(),
            &NextRef::Address("https://example.com/list/2".to_string())
        );
    }

    #[tokio::test]
    async fn test_next_link_resolves_against_redirect_target() {
        let source = MemorySource::new()
            .with_page(
                "https://example.com/p/2/",
                r#"<div class="item">two</div><a class="next" href="3">next</a>"#,
            )
            .with_redirect("https://example.com/p/2", "https://example.com/p/2/");
        let page = fetcher(source)
            .fetch_page("https://example.com/p/2".to_string())
            .await
            .unwrap();
        assert_eq!(page.address(), "https://example.com/p/2");
        assert_eq!(
            page.next_ref(),
            &NextRef::Address("https://example.com/p/2/3".to_string())
        );
    }

    #[tokio::test]
    async fn test_network_failure_collapses_to_fetch_error() {
        let err = fetcher(MemorySource::new())
            .fetch_page("https://example.com/missing".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.address, "https://example.com/missing");
        assert_eq!(err.cause, FetchCause::Status(404));
    }

    #[tokio::test]
    async fn test_locator_failure_collapses_to_fetch_error() {
        let source = MemorySource::new().with_page("https://example.com/", "<div></div>");
        let locator = Locator::new(LocatorSpec::new("div[", "a")).unwrap();
        let err = Fetcher::new(source, locator)
            .fetch_page("https://example.com/".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err.cause, FetchCause::Locator(_)));
    }

    #[tokio::test]
    async fn test_empty_initial_page_is_configuration_error() {
        let source = MemorySource::new().with_page("https://example.com/", "<p>nothing</p>");
        let err = fetcher(source)
            .fetch_initial("https://example.com/")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::EmptyInitialPage { .. })
        ));
    }
}
