//! Export statistics
//!
//! This module condenses a finished crawl into counts for the end-of-run
//! summary printed by the binary.

use crate::crawler::{CrawlReport, ExportSummary};
use crate::state::PageState;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Export statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Pages written to the export
    pub pages_exported: usize,

    /// Exported pages that came from fallback conversion
    pub pages_degraded: usize,

    /// Fragment section files among the exported pages
    pub fragment_pages: usize,

    /// Count of dequeued URLs by final state
    pub pages_by_state: BTreeMap<PageState, usize>,

    /// Total words across exported pages
    pub total_words: usize,

    /// Distinct endpoint signatures across exported pages
    pub endpoints_found: usize,

    /// URLs left unvisited in the frontier
    pub frontier_remaining: usize,

    pub elapsed: Duration,

    pub output_dir: PathBuf,

    pub archive: Option<PathBuf>,
}

impl CrawlStatistics {
    /// Number of dequeued URLs that were deliberately not exported
    pub fn skipped(&self) -> usize {
        self.pages_by_state
            .iter()
            .filter(|(state, _)| state.is_skipped())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn failed(&self) -> usize {
        self.pages_by_state
            .get(&PageState::Failed)
            .copied()
            .unwrap_or(0)
    }
}

/// Computes statistics for a finished export
pub fn load_statistics(summary: &ExportSummary) -> CrawlStatistics {
    let report: &CrawlReport = &summary.report;

    let mut pages_by_state = BTreeMap::new();
    for outcome in &report.outcomes {
        *pages_by_state.entry(outcome.state).or_insert(0) += 1;
    }

    let mut endpoints = std::collections::HashSet::new();
    for record in &report.repository {
        endpoints.extend(record.detected_endpoints.iter().cloned());
    }

    CrawlStatistics {
        pages_exported: report.repository.len(),
        pages_degraded: report.repository.degraded_count(),
        fragment_pages: report.repository.iter().filter(|r| r.is_fragment).count(),
        pages_by_state,
        total_words: report.repository.iter().map(|r| r.word_count).sum(),
        endpoints_found: endpoints.len(),
        frontier_remaining: report.frontier_remaining,
        elapsed: report.elapsed(),
        output_dir: summary.output_dir.clone(),
        archive: summary.archive.clone(),
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Export Summary ===\n");

    println!("Overview:");
    println!("  Pages exported: {}", stats.pages_exported);
    println!("  Degraded (fallback): {}", stats.pages_degraded);
    println!("  Fragment sections: {}", stats.fragment_pages);
    println!("  Total words: {}", stats.total_words);
    println!("  Endpoints found: {}", stats.endpoints_found);
    println!("  Left in frontier: {}", stats.frontier_remaining);
    println!();

    let total: usize = stats.pages_by_state.values().sum();
    if total > 0 {
        println!("Pages by State:");
        let mut state_counts: Vec<_> = stats.pages_by_state.iter().collect();
        state_counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

        for (state, count) in state_counts {
            let percentage = (*count as f64 / total as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", state, count, percentage);
        }
        println!();
    }

    println!("Output directory: {}", stats.output_dir.display());
    match &stats.archive {
        Some(archive) => println!("Archive: {}", archive.display()),
        None => println!("Archive: none"),
    }
    println!("Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
}
