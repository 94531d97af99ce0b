//! Crawl eligibility decisions
//!
//! The static half (scheme, host, path prefix) is a pure function used when a
//! link is enqueued and again when it is dequeued. The robots half needs the
//! network and runs inside the worker.

use crate::config::CrawlConfig;
use crate::robots::RobotsChecker;
use crate::url::{extract_domain, normalize_url};
use crate::ConfigError;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Immutable scope snapshot for one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeConfig {
    /// Hosts a page may live on; empty means any host
    pub seed_hosts: BTreeSet<String>,

    /// Literal path prefix, stored without a trailing slash
    pub path_prefix: Option<String>,

    pub respect_robots: bool,

    pub max_pages: usize,
}

impl ScopeConfig {
    /// Derives the scope from the crawl section of the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(ScopeConfig)` - The scope snapshot
    /// * `Err(ConfigError::InvalidUrl)` - A seed could not be parsed
    pub fn from_crawl_config(config: &CrawlConfig) -> Result<Self, ConfigError> {
        let mut seed_hosts = BTreeSet::new();

        if config.same_domain {
            for seed in &config.seeds {
                let url = normalize_url(seed).map_err(|e| {
                    ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
                })?;
                if let Some(host) = extract_domain(&url) {
                    seed_hosts.insert(host);
                }
            }
        }

        Ok(Self {
            seed_hosts,
            path_prefix: config.path_prefix.as_deref().and_then(normalize_prefix),
            respect_robots: config.respect_robots,
            max_pages: config.max_pages,
        })
    }

    /// Scheme, host and path-prefix checks; never touches the network
    pub fn check_static(&self, url: &Url) -> ScopeDecision {
        if url.scheme() != "http" && url.scheme() != "https" {
            return ScopeDecision::UnsupportedScheme;
        }

        if !self.seed_hosts.is_empty() {
            match extract_domain(url) {
                Some(host) if self.seed_hosts.contains(&host) => {}
                _ => return ScopeDecision::ForeignHost,
            }
        }

        if let Some(prefix) = &self.path_prefix {
            if !url.path().starts_with(prefix.as_str()) {
                return ScopeDecision::OutsidePrefix;
            }
        }

        ScopeDecision::Accepted
    }
}

/// `/api/` and `/api` are the same prefix; `/` is no restriction at all
fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Why a URL was or was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeDecision {
    Accepted,
    UnsupportedScheme,
    ForeignHost,
    OutsidePrefix,
    RobotsDisallowed,
}

impl ScopeDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl fmt::Display for ScopeDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Accepted => "accepted",
            Self::UnsupportedScheme => "unsupported scheme",
            Self::ForeignHost => "host outside seed domains",
            Self::OutsidePrefix => "path outside prefix",
            Self::RobotsDisallowed => "disallowed by robots.txt",
        };
        f.write_str(reason)
    }
}

/// Full scope filter: static checks plus the robots policy
#[derive(Clone)]
pub struct ScopeFilter {
    scope: Arc<ScopeConfig>,
    robots: Arc<dyn RobotsChecker>,
    user_agent: String,
}

impl ScopeFilter {
    /// # Arguments
    ///
    /// * `scope` - The run's scope snapshot
    /// * `robots` - Robots policy capability
    /// * `user_agent` - Product token matched against `User-agent:` lines
    pub fn new(scope: Arc<ScopeConfig>, robots: Arc<dyn RobotsChecker>, user_agent: &str) -> Self {
        Self {
            scope,
            robots,
            user_agent: user_agent.to_string(),
        }
    }

    pub fn scope(&self) -> &ScopeConfig {
        &self.scope
    }

    /// Decides whether `url` may be crawled
    ///
    /// Robots lookup errors are logged and treated as allowed.
    pub async fn accept(&self, url: &Url) -> ScopeDecision {
        let decision = self.scope.check_static(url);
        if !decision.is_accepted() || !self.scope.respect_robots {
            return decision;
        }

        match self.robots.is_allowed(url, &self.user_agent).await {
            Ok(true) => ScopeDecision::Accepted,
            Ok(false) => ScopeDecision::RobotsDisallowed,
            Err(e) => {
                tracing::warn!("Robots check failed for {}, allowing: {}", url, e);
                ScopeDecision::Accepted
            }
        }
    }
}

impl fmt::Debug for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeFilter")
            .field("scope", &self.scope)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}
