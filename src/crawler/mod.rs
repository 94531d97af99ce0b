//! Crawler module: from seed URLs to a finished export
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of raw HTML
//! - HTML parsing and link extraction
//! - The BFS frontier and visited set
//! - Overall crawl coordination and the export pipeline

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{Coordinator, CrawlReport, PageOutcome};
pub use fetcher::{
    build_http_client, fetch_url, is_html_content_type, FetchResult, FetchedPage, Fetcher,
    HttpFetcher,
};
pub use frontier::{CrawlTask, Frontier, VisitedSet};
pub use parser::{
    collapse_whitespace, extract_markdown_links, parse_html, resolve_link, truncate_chars,
    ParsedPage, MAX_DESCRIPTION_CHARS,
};

use crate::config::{validate, Config};
use crate::extract::{FallbackConverter, Html2MdFallback, Renderer, StaticHtmlRenderer};
use crate::output::{archive_path, package_directory, write_indexes};
use crate::robots::{HttpRobotsChecker, RobotsChecker};
use crate::url::{extract_domain, split_fragment};
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Name used for the export when no seed yields a host
const DEFAULT_SITE_NAME: &str = "export";

/// External capabilities a crawl runs against
#[derive(Clone)]
pub struct CrawlServices {
    pub renderer: Arc<dyn Renderer>,
    pub fallback: Arc<dyn FallbackConverter>,
    pub fetcher: Arc<dyn Fetcher>,
    pub robots: Arc<dyn RobotsChecker>,
}

impl CrawlServices {
    /// HTTP-backed services sharing one reqwest client
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlServices)` - Services ready for a crawl
    /// * `Err(ScraperError::Reqwest)` - The HTTP client could not be built
    pub fn http(config: &Config) -> Result<Self> {
        let client = build_http_client(&config.user_agent, &config.fetch)?;
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(client.clone()));

        Ok(Self {
            renderer: Arc::new(StaticHtmlRenderer::new(Arc::clone(&fetcher))),
            fallback: Arc::new(Html2MdFallback),
            fetcher,
            robots: Arc::new(HttpRobotsChecker::new(client)),
        })
    }
}

/// Result of a successful export
#[derive(Debug)]
pub struct ExportSummary {
    pub report: CrawlReport,
    pub output_dir: PathBuf,
    /// Zip archive, when one was requested and could be written
    pub archive: Option<PathBuf>,
}

/// Runs a complete export with the default HTTP services
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration
/// 2. Crawl breadth-first from the seeds, writing one file per page
/// 3. Write the index files
/// 4. Package the export directory when enabled
///
/// # Arguments
///
/// * `config` - The run configuration
///
/// # Returns
///
/// * `Ok(ExportSummary)` - The export completed
/// * `Err(ScraperError)` - Configuration, crawl or output failure
///
/// # Example
///
/// ```no_run
/// use llms_scraper::config::load_config;
/// use llms_scraper::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("scraper.toml"))?;
/// let summary = crawl(&config).await?;
/// println!("{} pages", summary.report.repository.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: &Config) -> Result<ExportSummary> {
    let services = CrawlServices::http(config)?;
    crawl_with_services(config, services).await
}

/// Runs a complete export against the given services
pub async fn crawl_with_services(config: &Config, services: CrawlServices) -> Result<ExportSummary> {
    validate(config)?;

    let report = Coordinator::new(config, services)?.run().await?;

    let output_dir = config.output.directory.clone();
    let site = site_name(config);
    write_indexes(
        &output_dir,
        &report.repository,
        config.output.index_mode,
        &site,
    )?;

    let archive = if config.output.create_zip {
        let path = archive_path(&output_dir, config.output.zip_name.as_deref(), &site);
        match package_directory(&output_dir, &path) {
            Ok(_) => Some(path),
            Err(e) => {
                tracing::warn!("Failed to create archive {}: {}", path.display(), e);
                None
            }
        }
    } else {
        None
    };

    Ok(ExportSummary {
        report,
        output_dir,
        archive,
    })
}

/// Host of the first seed, used for the index header and the archive name
pub fn site_name(config: &Config) -> String {
    config
        .crawl
        .seeds
        .iter()
        .filter_map(|seed| split_fragment(seed).ok())
        .find_map(|(url, _)| extract_domain(&url))
        .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string())
}
