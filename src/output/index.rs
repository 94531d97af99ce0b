//! Index artifacts
//!
//! Every builder here is a pure function of the content repository; nothing
//! is fetched or recomputed. [`write_indexes`] puts the selected artifacts at
//! the export root.

use crate::config::IndexMode;
use crate::output::markdown::write_text;
use crate::repository::{ContentRepository, PageRecord};
use crate::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const LLMS_TXT: &str = "llms.txt";
pub const STANDARD_INDEX: &str = "llms_index.md";
pub const EXTENDED_INDEX: &str = "llms_index_extended.md";
pub const SITEMAP: &str = "sitemap.md";
pub const AI_INDEX: &str = "llms_ai_index.md";

/// Every file name an export may place at its root
pub const INDEX_FILES: &[&str] = &[LLMS_TXT, STANDARD_INDEX, EXTENDED_INDEX, SITEMAP, AI_INDEX];

const MAX_HEADING_LEVEL: usize = 6;

const AI_INDEX_PLACEHOLDER: &str = "# AI Index\n\n\
This file is reserved for an AI-enriched index of the export.\n\
It is intentionally left empty; see `llms_index.md` and `sitemap.md` for navigation.\n";

/// Minimal list: one bullet per page in visit order
///
/// # Arguments
///
/// * `site` - Name shown in the header, usually the seed host
/// * `repository` - The exported pages
pub fn build_llms_txt(site: &str, repository: &ContentRepository) -> String {
    let mut out = format!("# {} docs index\n\n", site);
    for record in repository {
        out.push_str(&format!(
            "- [{}]({})",
            link_text(&record.title),
            record.output_path
        ));
        if let Some(summary) = record.summary.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(": ");
            out.push_str(&single_line(summary));
        }
        out.push('\n');
    }
    out
}

/// `| Title | File | Source URL |` table
pub fn build_standard_index(repository: &ContentRepository) -> String {
    let mut out = String::from("# LLMS Export Index\n\n");
    out.push_str("| Title | File | Source URL |\n");
    out.push_str("|---|---|---|\n");
    for record in repository {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_cell(&record.title),
            escape_cell(&record.output_path),
            escape_cell(&record.display_url()),
        ));
    }
    out
}

/// Standard table plus per-page metrics
pub fn build_extended_index(repository: &ContentRepository) -> String {
    let mut out = String::from("# LLMS Export Index (Extended)\n\n");
    out.push_str("| Title | File | Source URL | Words | Read (min) | First H2 | Endpoints |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    for record in repository {
        let endpoints = record
            .detected_endpoints
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");

        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            escape_cell(&record.title),
            escape_cell(&record.output_path),
            escape_cell(&record.display_url()),
            record.word_count,
            record.estimated_read_minutes,
            escape_cell(record.first_h2_heading.as_deref().unwrap_or("")),
            escape_cell(&endpoints),
        ));
    }
    out
}

/// Pages grouped under their directory, one heading per directory level
///
/// Directories are sorted lexicographically and every ancestor directory gets
/// a heading, so the outline mirrors the export tree. Pages keep visit order
/// within a directory.
pub fn build_sitemap(repository: &ContentRepository) -> String {
    let mut groups: BTreeMap<&str, Vec<&PageRecord>> = BTreeMap::new();
    for record in repository {
        let directory = record.directory();
        for ancestor in ancestors(directory) {
            groups.entry(ancestor).or_default();
        }
        groups.entry(directory).or_default().push(record);
    }

    let mut out = String::from("# Sitemap\n");
    for (directory, records) in &groups {
        let depth = if directory.is_empty() {
            0
        } else {
            directory.split('/').count()
        };
        let level = (depth + 2).min(MAX_HEADING_LEVEL);
        let label = if directory.is_empty() {
            "/".to_string()
        } else {
            format!("{}/", directory)
        };

        out.push_str(&format!("\n{} {}\n", "#".repeat(level), label));
        if !records.is_empty() {
            out.push('\n');
        }
        for record in records {
            out.push_str(&format!(
                "- [{}]({})\n",
                link_text(&record.title),
                record.output_path
            ));
        }
    }
    out
}

/// Content of the AI-enriched index; independent of the pages
pub fn ai_index_placeholder() -> &'static str {
    AI_INDEX_PLACEHOLDER
}

/// Writes the index artifacts selected by `mode`
///
/// `llms.txt`, `sitemap.md` and `llms_ai_index.md` are written in every mode.
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - The files written, in a fixed order
/// * `Err(ScraperError::Io)` - A file could not be written
pub fn write_indexes(
    root: &Path,
    repository: &ContentRepository,
    mode: IndexMode,
    site: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = vec![write_text(root, LLMS_TXT, &build_llms_txt(site, repository))?];

    if mode.includes_standard() {
        written.push(write_text(
            root,
            STANDARD_INDEX,
            &build_standard_index(repository),
        )?);
    }
    if mode.includes_extended() {
        written.push(write_text(
            root,
            EXTENDED_INDEX,
            &build_extended_index(repository),
        )?);
    }

    written.push(write_text(root, SITEMAP, &build_sitemap(repository))?);
    written.push(write_text(root, AI_INDEX, ai_index_placeholder())?);

    tracing::info!("Wrote {} index files to {}", written.len(), root.display());
    Ok(written)
}

/// Escapes a value for use inside a Markdown table cell
pub fn escape_cell(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
}

fn link_text(title: &str) -> String {
    single_line(title).replace('[', "\\[").replace(']', "\\]")
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Proper ancestors of a `/`-separated directory, including the root `""`
fn ancestors(directory: &str) -> Vec<&str> {
    if directory.is_empty() {
        return Vec::new();
    }
    let mut out = vec![""];
    out.extend(
        directory
            .match_indices('/')
            .map(|(index, _)| &directory[..index]),
    );
    out
}
