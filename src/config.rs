use crate::error::ConfigurationError;
use crate::locator::LocatorSpec;
use crate::store::DEFAULT_LOOK_AHEAD_LIMIT;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which network boundary to fetch through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Plain HTTP with a cookie store
    #[default]
    Http,
    /// A browser session driven over WebDriver
    Webdriver,
}

/// Locator for the documents whose address matches `url`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRule {
    /// Regex matched against the document address
    pub url: String,

    #[serde(flatten)]
    pub locator: LocatorSpec,
}

/// Configuration of one pagination session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagerConfig {
    /// Address of the document to extend
    pub start_url: String,

    /// Site rules, first match wins
    #[serde(default)]
    pub sites: Vec<SiteRule>,

    /// Pages fetched ahead of the furthest page reached
    #[serde(default = "default_look_ahead_limit")]
    pub look_ahead_limit: usize,

    /// Network boundary
    #[serde(default)]
    pub source: SourceKind,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Per-request timeout in seconds for the HTTP source
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Viewport height, in lines, used for page jumps
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
}

/// Default value for look_ahead_limit
fn default_look_ahead_limit() -> usize {
    DEFAULT_LOOK_AHEAD_LIMIT
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// Default value for viewport_height
fn default_viewport_height() -> f64 {
    40.0
}

impl PagerConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            sites: Vec::new(),
            look_ahead_limit: default_look_ahead_limit(),
            source: SourceKind::default(),
            webdriver_url: default_webdriver_url(),
            request_timeout_secs: None,
            viewport_height: default_viewport_height(),
        }
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add a rule that applies to every address
    pub fn with_locator(mut self, locator: LocatorSpec) -> Self {
        self.sites.insert(
            0,
            SiteRule {
                url: ".*".to_string(),
                locator,
            },
        );
        self
    }

    /// Locator of the first rule whose pattern matches `address`
    pub fn locator_for(&self, address: &str) -> Result<LocatorSpec, ConfigurationError> {
        for rule in &self.sites {
            let pattern =
                Regex::new(&rule.url).map_err(|source| ConfigurationError::InvalidPattern {
                    pattern: rule.url.clone(),
                    source,
                })?;
            if pattern.is_match(address) {
                ::log::debug!("Site rule `{}` matches {}", rule.url, address);
                return Ok(rule.locator.clone());
            }
        }

        Err(ConfigurationError::NoLocator {
            address: address.to_string(),
        })
    }
}
