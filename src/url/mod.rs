//! URL handling module for llms-scraper
//!
//! This module provides URL normalization, visit keys, host extraction and
//! the scope filter that decides which pages belong to an export.

mod domain;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::{extract_domain, origin_key};
pub use normalize::{normalize_url, split_fragment, visit_key};
pub use scope::{ScopeConfig, ScopeDecision, ScopeFilter};
