//! Zip packaging of a finished export

use crate::Result;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive location for an export: next to the export directory
///
/// `zip_name` gets a `.zip` extension when it has none; without a name the
/// archive is named after `fallback_stem` (the first seed host).
pub fn archive_path(output_dir: &Path, zip_name: Option<&str>, fallback_stem: &str) -> PathBuf {
    let name = match zip_name {
        Some(name) if name.to_ascii_lowercase().ends_with(".zip") => name.to_string(),
        Some(name) => format!("{}.zip", name),
        None => format!("{}.zip", fallback_stem),
    };

    match output_dir.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Zips every file under `source_dir` into `archive`
///
/// Entries are stored relative to `source_dir` with `/` separators, in sorted
/// order, deflate-compressed.
///
/// # Returns
///
/// * `Ok(usize)` - Number of files archived
/// * `Err(ScraperError)` - Walking, reading or writing failed
pub fn package_directory(source_dir: &Path, archive: &Path) -> Result<usize> {
    let mut files = Vec::new();
    collect_files(source_dir, source_dir, &mut files)?;
    files.sort();

    if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut zip = ZipWriter::new(File::create(archive)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for relative in &files {
        zip.start_file(relative.as_str(), options)?;
        let mut source = File::open(source_dir.join(relative))?;
        io::copy(&mut source, &mut zip)?;
    }
    zip.finish()?;

    tracing::info!(
        "Packaged {} files into {}",
        files.len(),
        archive.display()
    );
    Ok(files.len())
}

/// Relative `/`-separated paths of all regular files below `dir`
fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if path.is_file() {
            if let Ok(relative) = path.strip_prefix(root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
            }
        }
    }
    Ok(())
}
