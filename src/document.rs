use crate::error::LocatorError;
use crate::locator::QueryEngine;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Owned snapshot of an element matched by a locator query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Lower-case tag name
    pub name: String,

    /// Attributes in source order
    pub attrs: Vec<(String, String)>,

    /// Outer HTML of the element
    pub html: String,

    /// Concatenated text content
    pub text: String,
}

impl Fragment {
    /// Look up an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Number of text lines the fragment occupies (at least one)
    pub fn line_count(&self) -> usize {
        self.text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .count()
            .max(1)
    }

    fn from_element(element: ElementRef<'_>) -> Self {
        let value = element.value();
        Self {
            name: value.name().to_string(),
            attrs: value
                .attrs()
                .map(|(key, val)| (key.to_string(), val.to_string()))
                .collect(),
            html: element.html(),
            text: element.text().collect::<Vec<_>>().concat(),
        }
    }
}

/// HTML document backed by `scraper`, queried with CSS selectors
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses an HTML document. html5ever recovers from malformed markup,
    /// so this never fails.
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    fn compile(query: &str) -> Result<Selector, LocatorError> {
        Selector::parse(query).map_err(|e| LocatorError::InvalidQuery {
            query: query.to_string(),
            reason: e.to_string(),
        })
    }
}

impl QueryEngine for HtmlDocument {
    fn query_all(&self, query: &str) -> Result<Vec<Fragment>, LocatorError> {
        let selector = Self::compile(query)?;
        let fragments = self
            .html
            .select(&selector)
            .map(Fragment::from_element)
            .collect::<Vec<_>>();

        ::log::trace!("Query `{}` matched {} elements", query, fragments.len());
        Ok(fragments)
    }

    fn query_first(&self, query: &str) -> Result<Option<Fragment>, LocatorError> {
        let selector = Self::compile(query)?;
        Ok(self.html.select(&selector).next().map(Fragment::from_element))
    }
}
