//! Derived metrics over a Markdown body
//!
//! All heuristics here are plain text matching; they do not parse Markdown.

use crate::crawler::{collapse_whitespace, truncate_chars, MAX_DESCRIPTION_CHARS};
use crate::repository::Endpoint;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Reading speed used for `estimated_read_minutes`
pub const WORDS_PER_MINUTE: usize = 200;

static ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(GET|POST|PUT|PATCH|DELETE)\s+(/\S*)").expect("endpoint pattern")
});

/// Punctuation that commonly trails an endpoint path in prose or code spans
const TRAILING_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', ')', ']', '>', '\'', '"', '`', '*',
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageMetrics {
    pub word_count: usize,
    pub estimated_read_minutes: usize,
    pub first_h2_heading: Option<String>,
    pub detected_endpoints: Vec<Endpoint>,
}

impl PageMetrics {
    pub fn compute(markdown: &str) -> Self {
        let word_count = word_count(markdown);
        Self {
            word_count,
            estimated_read_minutes: read_minutes(word_count),
            first_h2_heading: first_h2_heading(markdown),
            detected_endpoints: detect_endpoints(markdown),
        }
    }
}

/// Whitespace-delimited token count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// `ceil(words / 200)`, never less than one minute
pub fn read_minutes(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Text of the first level-2 heading (`## Text` or `Text` over a `---` line)
pub fn first_h2_heading(markdown: &str) -> Option<String> {
    first_heading(markdown, 2)
}

/// Text of the first level-1 heading (`# Text` or `Text` over a `===` line)
pub fn first_h1_heading(markdown: &str) -> Option<String> {
    first_heading(markdown, 1)
}

fn first_heading(markdown: &str, level: usize) -> Option<String> {
    let marker = format!("{} ", "#".repeat(level));
    let underline = if level == 1 { '=' } else { '-' };

    let mut lines = markdown.lines().peekable();
    let mut in_code = false;

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if is_fence(trimmed) {
            in_code = !in_code;
            continue;
        }
        if in_code {
            continue;
        }

        if let Some(text) = line.trim_start().strip_prefix(marker.as_str()) {
            let text = text.trim().trim_end_matches('#').trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
            continue;
        }

        if !trimmed.is_empty() && !trimmed.starts_with(['#', '-', '*', '+', '>', '|', '=']) {
            if let Some(next) = lines.peek() {
                if is_setext_underline(next, underline) {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

fn is_fence(trimmed: &str) -> bool {
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// `===` or `---` line under a setext heading
fn is_setext_underline(line: &str, underline: char) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.chars().all(|c| c == underline)
}

/// `METHOD /path` signatures in order of first appearance
pub fn detect_endpoints(markdown: &str) -> Vec<Endpoint> {
    let mut seen = HashSet::new();
    let mut endpoints = Vec::new();

    for captures in ENDPOINT.captures_iter(markdown) {
        let (Some(method), Some(path)) = (captures.get(1), captures.get(2)) else {
            continue;
        };

        let trimmed = path.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        let path = if trimmed.is_empty() { "/" } else { trimmed };

        let endpoint = Endpoint {
            method: method.as_str().to_string(),
            path: path.to_string(),
        };
        if seen.insert(endpoint.clone()) {
            endpoints.push(endpoint);
        }
    }

    endpoints
}

/// First prose line of a Markdown body, for use as an index summary
///
/// Skips headings, quotes, tables, list markers, code fences and images.
pub fn summarize(markdown: &str) -> Option<String> {
    let mut lines = markdown.lines().peekable();
    let mut in_code = false;

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if is_fence(trimmed) {
            in_code = !in_code;
            continue;
        }
        if in_code || trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with(['#', '>', '|', '-', '*', '!', '<', '=']) {
            continue;
        }
        if lines
            .peek()
            .is_some_and(|next| is_setext_underline(next, '=') || is_setext_underline(next, '-'))
        {
            continue;
        }

        let text = collapse_whitespace(trimmed);
        if !text.is_empty() {
            return Some(truncate_chars(&text, MAX_DESCRIPTION_CHARS));
        }
    }

    None
}
