use std::fmt;

/// An HTTP endpoint signature found in a page body, e.g. `GET /users/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub method: String,
    pub path: String,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// One exported Markdown file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Normalized page URL, fragment stripped
    pub source_url: String,

    /// Fragment this record was sliced from, if any
    pub fragment: Option<String>,

    pub title: String,

    pub markdown_body: String,

    /// Path relative to the export root, `/`-separated
    pub output_path: String,

    pub is_fragment: bool,

    pub word_count: usize,

    pub estimated_read_minutes: usize,

    pub first_h2_heading: Option<String>,

    pub detected_endpoints: Vec<Endpoint>,

    /// Rank among accepted pages, contiguous from 0
    pub visit_order: usize,

    /// Link distance from the nearest seed
    pub depth: u32,

    /// Short description for `llms.txt`
    pub summary: Option<String>,

    /// Produced by fallback conversion after the renderer failed
    pub degraded: bool,
}

impl PageRecord {
    /// The URL shown in the `> Source:` line, fragment included
    pub fn display_url(&self) -> String {
        match &self.fragment {
            Some(fragment) if self.is_fragment => format!("{}#{}", self.source_url, fragment),
            _ => self.source_url.clone(),
        }
    }

    /// Directory part of `output_path`; empty for files at the export root
    pub fn directory(&self) -> &str {
        match self.output_path.rfind('/') {
            Some(index) => &self.output_path[..index],
            None => "",
        }
    }
}
