use crate::document::Fragment;
use crate::error::{ConfigurationError, LocatorError};
use crate::page::Page;
use serde::{Deserialize, Serialize};

/// Query pair describing where a site keeps its content and its next link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorSpec {
    /// Selects the content fragments of a page
    #[serde(alias = "pageElement")]
    pub content_query: String,

    /// Selects the element whose `href` points to the next page
    #[serde(alias = "nextLink")]
    pub next_link_query: String,
}

impl LocatorSpec {
    pub fn new(content_query: impl Into<String>, next_link_query: impl Into<String>) -> Self {
        Self {
            content_query: content_query.into(),
            next_link_query: next_link_query.into(),
        }
    }
}

/// Reference to the page following the current one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "snake_case")]
pub enum NextRef {
    /// Address of the next page
    Address(String),
    /// The next-link element exists but carries no address
    Absent,
    /// No next-link element was found
    Unresolved,
}

impl NextRef {
    /// The address to fetch, if any
    pub fn address(&self) -> Option<&str> {
        match self {
            NextRef::Address(address) => Some(address),
            NextRef::Absent | NextRef::Unresolved => None,
        }
    }

    /// True when no further page exists
    pub fn is_terminal(&self) -> bool {
        self.address().is_none()
    }
}

/// Structural query capability over a parsed document.
///
/// `HtmlDocument` implements it with CSS selectors; tests and other hosts can
/// plug in their own engine.
pub trait QueryEngine {
    /// All matches in document order. No match is an empty vector, not an error.
    fn query_all(&self, query: &str) -> Result<Vec<Fragment>, LocatorError>;

    /// The first match in document order.
    fn query_first(&self, query: &str) -> Result<Option<Fragment>, LocatorError>;
}

/// Extracts pages from documents according to a [`LocatorSpec`]
#[derive(Debug, Clone)]
pub struct Locator {
    spec: LocatorSpec,
}

impl Locator {
    /// Create a locator, rejecting blank queries
    pub fn new(spec: LocatorSpec) -> Result<Self, ConfigurationError> {
        if spec.content_query.trim().is_empty() {
            return Err(ConfigurationError::EmptyQuery {
                field: "content_query",
            });
        }
        if spec.next_link_query.trim().is_empty() {
            return Err(ConfigurationError::EmptyQuery {
                field: "next_link_query",
            });
        }
        Ok(Self { spec })
    }

    pub fn spec(&self) -> &LocatorSpec {
        &self.spec
    }

    /// Evaluate both queries once so malformed ones surface before any fetch
    pub fn validate<E: QueryEngine>(&self, engine: &E) -> Result<(), LocatorError> {
        engine.query_first(&self.spec.content_query)?;
        engine.query_first(&self.spec.next_link_query)?;
        Ok(())
    }

    /// Content fragments in document order
    pub fn fragments<E: QueryEngine>(&self, document: &E) -> Result<Vec<Fragment>, LocatorError> {
        document.query_all(&self.spec.content_query)
    }

    /// Next-page reference of the document
    pub fn next_ref<E: QueryEngine>(&self, document: &E) -> Result<NextRef, LocatorError> {
        let Some(link) = document.query_first(&self.spec.next_link_query)? else {
            return Ok(NextRef::Unresolved);
        };

        match link.attr("href").map(str::trim) {
            Some(href) if !href.is_empty() => Ok(NextRef::Address(href.to_string())),
            _ => Ok(NextRef::Absent),
        }
    }

    /// Extract a page. The address is attached later with [`Page::located_at`].
    pub fn parse<E: QueryEngine>(&self, document: &E) -> Result<Page, LocatorError> {
        let fragments = self.fragments(document)?;
        let next_ref = self.next_ref(document)?;

        if fragments.is_empty() {
            ::log::warn!(
                "Content query `{}` matched nothing; check the locator",
                self.spec.content_query
            );
        }
        ::log::debug!(
            "Located {} fragments, next: {:?}",
            fragments.len(),
            next_ref
        );

        Ok(Page::new(fragments, next_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    fn locator() -> Locator {
        Locator::new(LocatorSpec::new("article", "a[rel=next]")).unwrap()
    }

    #[test]
    fn test_parse_fragments_and_address() {
        let doc = HtmlDocument::parse(
            r#"<body><article>1</article><aside>x</aside><article>2</article>
            <a rel="next" href="?page=2">more</a></body>"#,
        );
        let page = locator().parse(&doc).unwrap();
        let texts: Vec<_> = page.fragments().iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2"]);
        assert_eq!(page.next_ref(), &NextRef::Address("?page=2".to_string()));
    }

    #[test]
    fn test_missing_link_is_unresolved() {
        let doc = HtmlDocument::parse("<body><article>1</article></body>");
        let page = locator().parse(&doc).unwrap();
        assert_eq!(page.next_ref(), &NextRef::Unresolved);
        assert!(page.next_ref().is_terminal());
    }

    #[test]
    fn test_link_without_href_is_absent() {
        let doc = HtmlDocument::parse(
            r#"<body><article>1</article><a rel="next" href="  ">x</a></body>"#,
        );
        assert_eq!(locator().next_ref(&doc).unwrap(), NextRef::Absent);

        let doc = HtmlDocument::parse(r#"<body><a rel="next">x</a></body>"#);
        assert_eq!(locator().next_ref(&doc).unwrap(), NextRef::Absent);
    }

    #[test]
    fn test_first_link_wins() {
        let doc = HtmlDocument::parse(
            r#"<body><a rel="next" href="/2">a</a><a rel="next" href="/3">b</a></body>"#,
        );
        assert_eq!(
            locator().next_ref(&doc).unwrap(),
            NextRef::Address("/2".to_string())
        );
    }

    #[test]
    fn test_malformed_query_propagates() {
        let locator = Locator::new(LocatorSpec::new("article", "a[rel=")).unwrap();
        let doc = HtmlDocument::parse("<body><article>1</article></body>");
        assert!(matches!(
            locator.parse(&doc),
            Err(LocatorError::InvalidQuery { .. })
        ));
        assert!(locator.validate(&doc).is_err());
    }

    #[test]
    fn test_blank_query_rejected() {
        let err = Locator::new(LocatorSpec::new("  ", "a")).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::EmptyQuery {
                field: "content_query"
            }
        ));
    }

    #[test]
    fn test_spec_accepts_siteinfo_names() {
        let spec: LocatorSpec =
            serde_json::from_str(r#"{"pageElement": "div.post", "nextLink": "a.next"}"#).unwrap();
        assert_eq!(spec, LocatorSpec::new("div.post", "a.next"));
    }
}
