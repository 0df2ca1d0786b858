use thiserror::Error;

/// Failure while evaluating a structural query against a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    /// The query could not be compiled by the query engine
    #[error("invalid query `{query}`: {reason}")]
    InvalidQuery { query: String, reason: String },
}

/// Why a remote fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    /// Transport failure (DNS, connection, body read, ...)
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-2xx status
    #[error("unexpected status {0}")]
    Status(u16),

    /// The WebDriver session could not navigate or return the source
    #[error("webdriver error: {0}")]
    WebDriver(String),

    /// The fetched document could not be located
    #[error(transparent)]
    Locator(#[from] LocatorError),
}

/// A failed fetch of one remote page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load {address}: {cause}")]
pub struct FetchError {
    pub address: String,
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(address: impl Into<String>, cause: impl Into<FetchCause>) -> Self {
        Self {
            address: address.into(),
            cause: cause.into(),
        }
    }
}

/// Startup problems that prevent auto-pagination from ever starting.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no locator configured for {address}")]
    NoLocator { address: String },

    #[error("locator query `{field}` is empty")]
    EmptyQuery { field: &'static str },

    #[error("content query selected nothing on {address}")]
    EmptyInitialPage { address: String },

    #[error("invalid site pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-level error for startup operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
