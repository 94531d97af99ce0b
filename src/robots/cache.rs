//! Per-origin robots.txt cache
//!
//! Each origin gets a `OnceCell`, so concurrent workers asking about the same
//! site trigger a single robots.txt download and share its result.

use crate::robots::ParsedRobots;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Result of fetching robots.txt for one origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// Parsed rules, or the reason robots.txt could not be obtained
    pub outcome: Result<ParsedRobots, String>,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(outcome: Result<ParsedRobots, String>) -> Self {
        Self {
            outcome,
            fetched_at: Utc::now(),
        }
    }
}

/// Origin-keyed cache of robots.txt lookups, owned by one crawl run
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<CachedRobots>>>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached entry for `origin`, running `fetch` only on first use
    ///
    /// # Arguments
    ///
    /// * `origin` - `scheme://host[:port]` of the site
    /// * `fetch` - Produces the entry; awaited at most once per origin
    pub async fn get_or_fetch<F, Fut>(&self, origin: &str, fetch: F) -> CachedRobots
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CachedRobots>,
    {
        let cell = {
            let mut entries = match self.entries.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            Arc::clone(entries.entry(origin.to_string()).or_default())
        };

        cell.get_or_init(fetch).await.clone()
    }

    /// Number of origins with a completed lookup
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.values().filter(|c| c.initialized()).count(),
            Err(poisoned) => poisoned
                .into_inner()
                .values()
                .filter(|c| c.initialized())
                .count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn deny_all() -> ParsedRobots {
        ParsedRobots::from_content("User-agent: *\nDisallow: /")
    }

    #[tokio::test]
    async fn test_fetch_runs_once_per_origin() {
        let cache = Arc::new(RobotsCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("https://x.test", || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        CachedRobots::new(Ok(deny_all()))
                    })
                    .await
            }));
        }

        for handle in handles {
            let entry = handle.await.unwrap();
            assert_eq!(entry.outcome.unwrap(), deny_all());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_cached_too() {
        let cache = RobotsCache::new();

        let first = cache
            .get_or_fetch("https://down.test", || async {
                CachedRobots::new(Err("connection refused".to_string()))
            })
            .await;
        assert!(first.outcome.is_err());

        let second = cache
            .get_or_fetch("https://down.test", || async {
                CachedRobots::new(Ok(ParsedRobots::allow_all()))
            })
            .await;
        assert!(second.outcome.is_err());
    }

    #[tokio::test]
    async fn test_origins_are_independent() {
        let cache = RobotsCache::new();
        assert!(cache.is_empty());

        cache
            .get_or_fetch("https://a.test", || async {
                CachedRobots::new(Ok(ParsedRobots::allow_all()))
            })
            .await;
        let b = cache
            .get_or_fetch("https://b.test", || async {
                CachedRobots::new(Ok(deny_all()))
            })
            .await;

        assert_eq!(b.outcome.unwrap(), deny_all());
        assert_eq!(cache.len(), 2);
    }
}
