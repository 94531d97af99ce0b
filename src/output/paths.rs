//! Output path synthesis
//!
//! Maps `(url, fragment)` to a relative Markdown path that mirrors the site's
//! path hierarchy. Paths are memoized for the run, and two different pages
//! never share a path: later arrivals get a `-2`, `-3`, ... suffix.

use percent_encoding::percent_decode_str;
use std::collections::{HashMap, HashSet};
use url::Url;

/// Longest sanitized segment, in bytes
pub const MAX_SEGMENT_BYTES: usize = 80;

/// Base filename for a URL with an empty path
pub const ROOT_STEM: &str = "root";

const UNTITLED_STEM: &str = "untitled";

const RESERVED_WINDOWS_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Deterministic, collision-free path allocator for one export
#[derive(Debug, Default)]
pub struct PathSynthesizer {
    assigned: HashMap<(String, Option<String>), String>,
    /// Lowercased paths already handed out or reserved
    taken: HashSet<String>,
}

impl PathSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a synthesizer that will never hand out the given paths
    ///
    /// Used to keep page files from shadowing the index files at the export root.
    pub fn with_reserved<'a>(reserved: impl IntoIterator<Item = &'a str>) -> Self {
        let mut synthesizer = Self::new();
        synthesizer
            .taken
            .extend(reserved.into_iter().map(str::to_lowercase));
        synthesizer
    }

    /// Returns the output path for `url` (and `fragment`)
    ///
    /// Calling this again with the same pair returns the same path.
    ///
    /// # Example
    ///
    /// ```
    /// use llms_scraper::output::PathSynthesizer;
    /// use url::Url;
    ///
    /// let mut paths = PathSynthesizer::new();
    /// let url = Url::parse("https://x.test/api/v1/users").unwrap();
    /// assert_eq!(paths.synthesize(&url, None), "api/v1/users.md");
    /// assert_eq!(paths.synthesize(&url, Some("list")), "api/v1/users__list.md");
    /// ```
    pub fn synthesize(&mut self, url: &Url, fragment: Option<&str>) -> String {
        let key = (url.as_str().to_string(), fragment.map(str::to_string));
        if let Some(path) = self.assigned.get(&key) {
            return path.clone();
        }

        let (directories, stem) = candidate(url, fragment);
        let mut path = join_path(&directories, &stem, None);
        let mut counter = 2;
        while self.taken.contains(&path.to_lowercase()) {
            tracing::debug!("Output path {} taken, trying suffix -{}", path, counter);
            path = join_path(&directories, &stem, Some(counter));
            counter += 1;
        }

        self.taken.insert(path.to_lowercase());
        self.assigned.insert(key, path.clone());
        path
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Directory segments and base stem for a URL, before collision handling
fn candidate(url: &Url, fragment: Option<&str>) -> (Vec<String>, String) {
    let mut segments: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| sanitize_segment(&percent_decode_str(s).decode_utf8_lossy()))
                .collect()
        })
        .unwrap_or_default();

    let mut stem = segments.pop().unwrap_or_else(|| ROOT_STEM.to_string());
    if let Some(fragment) = fragment {
        stem = format!("{}__{}", stem, sanitize_segment(fragment));
    }

    (segments, stem)
}

fn join_path(directories: &[String], stem: &str, counter: Option<usize>) -> String {
    let file = match counter {
        Some(n) => format!("{}-{}.md", stem, n),
        None => format!("{}.md", stem),
    };
    if directories.is_empty() {
        file
    } else {
        format!("{}/{}", directories.join("/"), file)
    }
}

/// Makes one path segment safe as a file or directory name
///
/// - filesystem-forbidden and control characters become `_`
/// - whitespace runs become a single `-`
/// - repeated `_` collapse
/// - leading and trailing `.`, `_`, `-` are trimmed
/// - case is preserved
/// - at most 80 bytes, cut on a char boundary
/// - Windows reserved device names get a trailing `_`
pub fn sanitize_segment(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut previous: Option<char> = None;

    for c in input.chars() {
        let mapped = if c.is_whitespace() {
            '-'
        } else if is_forbidden(c) {
            '_'
        } else {
            c
        };

        if (mapped == '_' || mapped == '-') && previous == Some(mapped) {
            continue;
        }
        cleaned.push(mapped);
        previous = Some(mapped);
    }

    let mut name = trim_separators(&cleaned).to_string();
    if name.len() > MAX_SEGMENT_BYTES {
        let mut cut = MAX_SEGMENT_BYTES;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
        name = trim_separators(&name).to_string();
    }

    if name.is_empty() {
        return UNTITLED_STEM.to_string();
    }

    if is_reserved_windows_name(&name) {
        name.push('_');
    }
    name
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(&['.', '_', '-'][..])
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}' | '\u{7F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED_WINDOWS_NAMES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(stem))
}
