//! Robots.txt handling module
//!
//! This module fetches, parses, and caches robots.txt files, and exposes the
//! `RobotsChecker` capability the scope filter consults before visiting a page.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use crate::url::origin_key;
use crate::{Result, ScraperError};
use reqwest::Client;
use url::Url;

/// Answers whether a URL may be crawled by a given user agent
///
/// Errors mean "could not decide"; callers treat them as allowed.
#[async_trait::async_trait]
pub trait RobotsChecker: Send + Sync {
    async fn is_allowed(&self, url: &Url, user_agent: &str) -> Result<bool>;
}

/// Fetches robots.txt for an origin
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - `scheme://host[:port]` of the site
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - Parsed rules; any 4xx (including 401/403) yields allow-all
/// * `Err(ScraperError)` - Network failure or server error
pub async fn fetch_robots(client: &Client, origin: &str) -> Result<ParsedRobots> {
    let robots_url = format!("{}/robots.txt", origin);

    let response = client
        .get(&robots_url)
        .send()
        .await
        .map_err(|source| ScraperError::Http {
            url: robots_url.clone(),
            source,
        })?;

    let status = response.status();
    if status.is_client_error() {
        return Ok(ParsedRobots::allow_all());
    }
    if !status.is_success() {
        return Err(ScraperError::HttpStatus {
            url: robots_url,
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|source| ScraperError::Http {
        url: robots_url,
        source,
    })?;
    Ok(ParsedRobots::from_content(&body))
}

/// `RobotsChecker` that downloads robots.txt at most once per origin
#[derive(Debug)]
pub struct HttpRobotsChecker {
    client: Client,
    cache: RobotsCache,
}

impl HttpRobotsChecker {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: RobotsCache::new(),
        }
    }
}

#[async_trait::async_trait]
impl RobotsChecker for HttpRobotsChecker {
    async fn is_allowed(&self, url: &Url, user_agent: &str) -> Result<bool> {
        let origin = origin_key(url);
        let entry = self
            .cache
            .get_or_fetch(&origin, || async {
                tracing::debug!("Fetching robots.txt for {}", origin);
                CachedRobots::new(
                    fetch_robots(&self.client, &origin)
                        .await
                        .map_err(|e| e.to_string()),
                )
            })
            .await;

        match entry.outcome {
            Ok(rules) => Ok(rules.is_allowed(url.as_str(), user_agent)),
            Err(message) => Err(ScraperError::Robots(format!("{}: {}", origin, message))),
        }
    }
}
