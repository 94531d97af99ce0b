//! HTTP fetcher implementation
//!
//! This module handles all raw HTTP requests for the scraper:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests for raw page HTML
//! - Content-Type gating (only HTML is accepted)
//! - Error classification into `FetchResult`

use crate::config::{FetchConfig, UserAgentConfig};
use crate::{Result, ScraperError};
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

const MAX_REDIRECTS: usize = 10;

const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure, ...)
    NetworkError {
        /// Error description
        error: String,
        /// Whether the request hit the client timeout
        timed_out: bool,
    },
}

impl FetchResult {
    /// Converts the classification into the crate error type
    pub fn into_page(self, url: &str) -> Result<FetchedPage> {
        match self {
            Self::Success {
                final_url, body, ..
            } => Ok(FetchedPage { final_url, body }),
            Self::ContentMismatch { content_type } => Err(ScraperError::ContentMismatch {
                url: url.to_string(),
                content_type,
            }),
            Self::HttpError { status_code } => Err(ScraperError::HttpStatus {
                url: url.to_string(),
                status: status_code,
            }),
            Self::NetworkError { timed_out: true, .. } => Err(ScraperError::Timeout {
                url: url.to_string(),
            }),
            Self::NetworkError { error, .. } => Err(ScraperError::Network {
                url: url.to_string(),
                message: error,
            }),
        }
    }
}

/// Raw HTML retrieved for a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL the body was served from, after redirects
    pub final_url: String,
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `fetch` - Network timeouts
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use llms_scraper::config::{FetchConfig, UserAgentConfig};
/// use llms_scraper::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetch: &FetchConfig,
) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(fetch.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with HTML Content-Type | `Success` |
/// | 2xx with any other Content-Type | `ContentMismatch` |
/// | Non-2xx status | `HttpError` |
/// | Timeout / connect / body error | `NetworkError` |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_network_error(e),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => classify_network_error(e),
    }
}

fn classify_network_error(e: reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            timed_out: true,
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", e),
            timed_out: false,
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
            timed_out: false,
        }
    }
}

/// True for `text/html` and `application/xhtml+xml`, ignoring parameters
pub fn is_html_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    HTML_CONTENT_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

/// Raw HTML retrieval capability
///
/// Used for fallback conversion and fragment slicing; swapped for a stub in tests.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// `Fetcher` backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        tracing::trace!("GET {}", url);
        fetch_url(&self.client, url).await.into_page(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), &FetchConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent_header_value() {
        let mut config = UserAgentConfig::default();
        assert_eq!(config.header_value(), "llms-scraper/1.2");

        config.contact_url = Some("https://example.com/bot".to_string());
        assert_eq!(
            config.header_value(),
            "llms-scraper/1.2 (+https://example.com/bot)"
        );
    }

    #[test]
    fn test_is_html_content_type() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("Application/XHTML+XML"));

        assert!(!is_html_content_type(""));
        assert!(!is_html_content_type("text/plain"));
        assert!(!is_html_content_type("application/json"));
    }

    #[test]
    fn test_fetch_result_into_page() {
        let ok = FetchResult::Success {
            final_url: "https://x.test/a".to_string(),
            status_code: 200,
            content_type: "text/html".to_string(),
            body: "<p>hi</p>".to_string(),
        };
        assert_eq!(ok.into_page("https://x.test/a").unwrap().body, "<p>hi</p>");

        let status = FetchResult::HttpError { status_code: 404 };
        assert!(matches!(
            status.into_page("https://x.test/missing"),
            Err(ScraperError::HttpStatus { status: 404, .. })
        ));

        let mismatch = FetchResult::ContentMismatch {
            content_type: "application/pdf".to_string(),
        };
        assert!(matches!(
            mismatch.into_page("https://x.test/a.pdf"),
            Err(ScraperError::ContentMismatch { .. })
        ));

        let timeout = FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            timed_out: true,
        };
        assert!(matches!(
            timeout.into_page("https://x.test/slow"),
            Err(ScraperError::Timeout { .. })
        ));
    }
}
