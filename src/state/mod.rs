//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: Outcome of an individual URL (queued, extracting, exported, skipped, failed)
//! - `CrawlPhase`: Lifecycle of the whole run (idle, running, completed, aborted)

mod crawl_phase;
mod page_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use page_state::PageState;
