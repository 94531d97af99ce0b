//! llms-scraper main entry point
//!
//! This is the command-line interface for exporting a documentation site
//! as LLM-ready Markdown.

use anyhow::{Context, Result};
use clap::Parser;
use llms_scraper::config::{
    compute_config_hash, parse_config_file, validate, Config, IndexMode,
};
use llms_scraper::crawler::{crawl, site_name};
use llms_scraper::output::{archive_path, load_statistics, print_statistics};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// llms-scraper: documentation sites to LLM-ready Markdown
///
/// Crawls a documentation site breadth-first within a page budget, writes one
/// Markdown file per page, and builds llms.txt, table indexes and a sitemap
/// over the export.
#[derive(Parser, Debug)]
#[command(name = "llms-scraper")]
#[command(version)]
#[command(about = "Export documentation sites as LLM-ready Markdown", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL to start from (repeatable); replaces the configured seeds
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Export directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Maximum number of pages to export
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Only export pages whose path starts with this prefix
    #[arg(long, value_name = "PREFIX")]
    path_prefix: Option<String>,

    /// Which table indexes to write: standard, extended or both
    #[arg(long, value_name = "MODE")]
    index_mode: Option<IndexMode>,

    /// Number of pages extracted concurrently
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Do not create a zip archive of the export
    #[arg(long)]
    no_zip: bool,

    /// Do not consult robots.txt
    #[arg(long)]
    ignore_robots: bool,

    /// Treat `#fragment` seeds as their whole page
    #[arg(long)]
    no_fragments: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if !self.seeds.is_empty() {
            config.crawl.seeds = self.seeds.clone();
        }
        if let Some(output) = &self.output {
            config.output.directory = output.clone();
        }
        if let Some(max_pages) = self.max_pages {
            config.crawl.max_pages = max_pages;
        }
        if let Some(prefix) = &self.path_prefix {
            config.crawl.path_prefix = Some(prefix.clone());
        }
        if let Some(mode) = self.index_mode {
            config.output.index_mode = mode;
        }
        if let Some(concurrency) = self.concurrency {
            config.crawl.concurrency = concurrency;
        }
        if self.no_zip {
            config.output.create_zip = false;
        }
        if self.ignore_robots {
            config.crawl.respect_robots = false;
        }
        if self.no_fragments {
            config.crawl.export_fragments = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let config = parse_config_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            let hash = compute_config_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("llms_scraper=info,warn"),
            1 => EnvFilter::new("llms_scraper=debug,info"),
            2 => EnvFilter::new("llms_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== llms-scraper Dry Run ===\n");

    println!("Crawl:");
    println!("  Seeds ({}):", config.crawl.seeds.len());
    for seed in &config.crawl.seeds {
        println!("    * {}", seed);
    }
    println!("  Same domain only: {}", config.crawl.same_domain);
    println!(
        "  Path prefix: {}",
        config.crawl.path_prefix.as_deref().unwrap_or("(none)")
    );
    println!("  Max pages: {}", config.crawl.max_pages);
    match config.crawl.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unlimited"),
    }
    println!("  Concurrency: {}", config.crawl.concurrency);
    println!("  Respect robots.txt: {}", config.crawl.respect_robots);
    println!("  Export fragments: {}", config.crawl.export_fragments);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nFetch:");
    println!("  Request timeout: {}s", config.fetch.request_timeout_secs);
    println!("  Render timeout: {}s", config.fetch.render_timeout_secs);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  Index mode: {}", config.output.index_mode);
    if config.output.create_zip {
        let archive = archive_path(
            &config.output.directory,
            config.output.zip_name.as_deref(),
            &site_name(config),
        );
        println!("  Archive: {}", archive.display());
    } else {
        println!("  Archive: disabled");
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> Result<()> {
    tracing::info!(
        "Exporting {} into {}",
        config.crawl.seeds.join(", "),
        config.output.directory.display()
    );

    let summary = crawl(config).await.context("Export failed")?;
    print_statistics(&load_statistics(&summary));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "llms-scraper",
            "--seed",
            "https://a.test/docs",
            "--seed",
            "https://a.test/api",
            "--max-pages",
            "10",
            "--index-mode",
            "extended",
            "--no-zip",
            "--ignore-robots",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.crawl.seeds.len(), 2);
        assert_eq!(config.crawl.max_pages, 10);
        assert_eq!(config.output.index_mode, IndexMode::Extended);
        assert!(!config.output.create_zip);
        assert!(!config.crawl.respect_robots);
        assert!(config.crawl.export_fragments);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["llms-scraper", "-q", "-v"]).is_err());
    }
}
