//! Configuration module for llms-scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use llms_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Crawl budget: {} pages", config.crawl.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, FetchConfig, IndexMode, OutputConfig, UserAgentConfig,
};

// Re-export parser and validation functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config_file,
    parse_config_str,
};
pub use validation::{validate, validate_seed};
