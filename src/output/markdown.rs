//! Per-page Markdown documents
//!
//! Every exported page starts with its title and source URL so the file is
//! self-describing once it leaves the export tree.

use crate::repository::PageRecord;
use crate::Result;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Formats the document written for one page
///
/// # Arguments
///
/// * `record` - The page to render
///
/// # Returns
///
/// `# <title>`, a blank line, `> Source: <url>`, a blank line, then the body
pub fn format_page_document(record: &PageRecord) -> String {
    let body = record.markdown_body.trim();

    let mut md = String::with_capacity(body.len() + record.title.len() + 64);
    md.push_str(&format!("# {}\n\n", single_line(&record.title)));
    md.push_str(&format!("> Source: {}\n\n", record.display_url()));
    md.push_str(body);
    md.push('\n');
    md
}

/// Writes a page document under `root`, creating parent directories as needed
///
/// # Arguments
///
/// * `root` - The export root directory
/// * `record` - The page to write; its `output_path` is relative to `root`
///
/// # Returns
///
/// * `Ok(PathBuf)` - Absolute or root-relative path of the written file
/// * `Err(ScraperError::Io)` - The file could not be written
pub fn write_page(root: &Path, record: &PageRecord) -> Result<PathBuf> {
    let path = root.join(&record.output_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(&path)?;
    file.write_all(format_page_document(record).as_bytes())?;

    Ok(path)
}

/// Writes a text artifact at `root/name`
pub fn write_text(root: &Path, name: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(root)?;
    let path = root.join(name);
    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    Ok(path)
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
