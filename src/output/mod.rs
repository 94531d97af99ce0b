//! Output module: everything written to disk
//!
//! This module handles:
//! - Deterministic output paths for pages
//! - Per-page Markdown documents
//! - The `llms.txt` family of indexes and the sitemap
//! - Zip packaging of the export
//! - End-of-run statistics

mod index;
mod markdown;
mod package;
mod paths;
pub mod stats;

pub use index::{
    ai_index_placeholder, build_extended_index, build_llms_txt, build_sitemap,
    build_standard_index, escape_cell, write_indexes, AI_INDEX, EXTENDED_INDEX, INDEX_FILES,
    LLMS_TXT, SITEMAP, STANDARD_INDEX,
};
pub use markdown::{format_page_document, write_page, write_text};
pub use package::{archive_path, package_directory};
pub use paths::{sanitize_segment, PathSynthesizer, MAX_SEGMENT_BYTES, ROOT_STEM};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
