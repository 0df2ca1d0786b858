use crate::error::FetchCause;
use crate::fetcher::{DocumentSource, Retrieved};
use reqwest::{Client, redirect};
use std::time::Duration;

/// Maximum redirects followed for one fetch
const MAX_REDIRECTS: usize = 10;

/// Plain HTTP source that keeps cookies across fetches and follows redirects
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Build a source; `timeout` of `None` leaves timeouts to the network stack
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchCause> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("auto-pager/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchCause::Network(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl DocumentSource for HttpSource {
    async fn retrieve(&self, address: &str) -> Result<Retrieved, FetchCause> {
        let response = self
            .client
            .get(address)
            .send()
            .await
            .map_err(|e| FetchCause::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            ::log::warn!("{} answered {}", address, status);
            return Err(FetchCause::Status(status.as_u16()));
        }
        let final_address = response.url().to_string();
        if final_address != address {
            ::log::debug!("{} redirected to {}", address, final_address);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchCause::Network(e.to_string()))?;
        Ok(Retrieved::new(final_address, body))
    }
}
