use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration structure for llms-scraper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl scope and budget configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// URLs the breadth-first crawl starts from
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Restrict the crawl to the hosts of the seed URLs
    #[serde(default = "default_true")]
    pub same_domain: bool,

    /// Only pages whose path starts with this prefix are exported
    #[serde(default)]
    pub path_prefix: Option<String>,

    /// Maximum number of pages to export
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum link distance from a seed
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Number of pages extracted concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Consult robots.txt before visiting a page
    #[serde(default = "default_true")]
    pub respect_robots: bool,

    /// Export `#fragment` sections of seed URLs as separate files
    #[serde(default = "default_true")]
    pub export_fragments: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            same_domain: true,
            path_prefix: None,
            max_pages: default_max_pages(),
            max_depth: None,
            concurrency: default_concurrency(),
            respect_robots: true,
            export_fragments: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler, also used as the robots.txt product token
    #[serde(default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(default)]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Full `User-Agent` header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Network timeouts
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Timeout for raw HTTP requests (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound for a single render call (seconds)
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            render_timeout_secs: default_render_timeout(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory of the export
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    /// Which table indexes to write
    #[serde(default)]
    pub index_mode: IndexMode,

    /// Zip the export directory when the crawl completes
    #[serde(default = "default_true")]
    pub create_zip: bool,

    /// Archive file name; derived from the first seed host when absent
    #[serde(default)]
    pub zip_name: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            index_mode: IndexMode::default(),
            create_zip: true,
            zip_name: None,
        }
    }
}

/// Selects which table indexes are written next to `llms.txt`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    Standard,
    Extended,
    #[default]
    Both,
}

impl IndexMode {
    pub fn includes_standard(self) -> bool {
        matches!(self, Self::Standard | Self::Both)
    }

    pub fn includes_extended(self) -> bool {
        matches!(self, Self::Extended | Self::Both)
    }
}

impl FromStr for IndexMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "extended" => Ok(Self::Extended),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "unknown index mode '{}', expected standard, extended or both",
                other
            )),
        }
    }
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::Extended => "extended",
            Self::Both => "both",
        };
        f.write_str(name)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> usize {
    200
}

fn default_concurrency() -> usize {
    4
}

fn default_crawler_name() -> String {
    "llms-scraper".to_string()
}

fn default_crawler_version() -> String {
    "1.2".to_string()
}

fn default_request_timeout() -> u64 {
    25
}

fn default_render_timeout() -> u64 {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./export")
}
