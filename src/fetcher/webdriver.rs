use crate::error::FetchCause;
use crate::fetcher::{DocumentSource, Retrieved};
use fantoccini::{Client, ClientBuilder};
use tokio::sync::OnceCell;

/// Ports tried when the configured WebDriver does not answer
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Source driven by a real browser through WebDriver.
///
/// The browser session keeps the site's cookies and follows redirects and
/// script navigation the same way a reader's browser would. The session is
/// opened on the first fetch.
pub struct WebDriverSource {
    webdriver_url: String,
    client: OnceCell<Client>,
}

impl WebDriverSource {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            client: OnceCell::new(),
        }
    }

    pub fn webdriver_url(&self) -> &str {
        &self.webdriver_url
    }

    async fn client(&self) -> Result<&Client, FetchCause> {
        self.client
            .get_or_try_init(|| connect_to_webdriver(&self.webdriver_url))
            .await
    }

    /// End the browser session if one was opened
    pub async fn close(self) {
        if let Some(client) = self.client.into_inner() {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close WebDriver session: {}", e);
            }
        }
    }
}

impl DocumentSource for WebDriverSource {
    async fn retrieve(&self, address: &str) -> Result<Retrieved, FetchCause> {
        let client = self.client().await?;

        client
            .goto(address)
            .await
            .map_err(|e| navigation_error(e, "accessing", address))?;

        let body = client
            .source()
            .await
            .map_err(|e| navigation_error(e, "getting source for", address))?;

        // The browser follows redirects itself; ask where it ended up
        let final_address = match client.current_url().await {
            Ok(url) => url.to_string(),
            Err(e) => {
                ::log::debug!("No current URL after loading {}: {}", address, e);
                address.to_string()
            }
        };
        Ok(Retrieved::new(final_address, body))
    }
}

/// Connects to the WebDriver instance, falling back to well-known ports
async fn connect_to_webdriver(webdriver_url: &str) -> Result<Client, FetchCause> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    for url in FALLBACK_WEBDRIVER_URLS.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(FetchCause::WebDriver(format!(
        "no WebDriver server reachable at {webdriver_url}"
    )))
}

fn navigation_error(error: fantoccini::error::CmdError, context: &str, url: &str) -> FetchCause {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {} {}", context, url);
    } else {
        ::log::error!("Failed {} {}: {}", context, url, error);
    }
    FetchCause::WebDriver(error.to_string())
}
