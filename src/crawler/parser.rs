//! HTML parser for extracting links and metadata
//!
//! This module handles parsing page content to extract:
//! - Links to follow (from `<a href>` tags, or Markdown link targets)
//! - Page title and a short description

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Longest description kept from a page's first paragraph
pub const MAX_DESCRIPTION_CHARS: usize = 280;

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#).expect("markdown link pattern")
});

static INLINE_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("inline href pattern")
});

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Text of the first non-empty `<p>`, capped at 280 characters
    pub description: Option<String>,

    /// Links found on the page: absolute, fragment-free, de-duplicated, in document order
    pub links: Vec<String>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
///
/// # Example
///
/// ```
/// use llms_scraper::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page#x">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page"]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        description: extract_description(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_description(document: &Html) -> Option<String> {
    let p_selector = Selector::parse("p").ok()?;

    document
        .select(&p_selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .find(|text| !text.is_empty())
        .map(|text| truncate_chars(&text, MAX_DESCRIPTION_CHARS))
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = LinkCollector::default();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                links.push(resolve_link(href, base_url));
            }
        }
    }

    links.finish()
}

/// Extracts link targets from a rendered Markdown body
///
/// Picks up `[text](target)` links and any inline `href="..."` left in the
/// body by the renderer; applies the same filtering as [`parse_html`].
pub fn extract_markdown_links(markdown: &str, base_url: &Url) -> Vec<String> {
    let mut links = LinkCollector::default();

    let mut found: Vec<(usize, &str)> = Vec::new();
    for pattern in [&*MARKDOWN_LINK, &*INLINE_HREF] {
        for captures in pattern.captures_iter(markdown) {
            if let Some(target) = captures.get(1) {
                found.push((target.start(), target.as_str()));
            }
        }
    }
    found.sort_by_key(|(position, _)| *position);

    for (_, href) in found {
        links.push(resolve_link(href, base_url));
    }

    links.finish()
}

/// Resolves a link href to an absolute, fragment-free URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);

    Some(absolute_url.to_string())
}

/// Order-preserving de-duplicating accumulator for discovered links
#[derive(Default)]
struct LinkCollector {
    seen: HashSet<String>,
    links: Vec<String>,
}

impl LinkCollector {
    fn push(&mut self, link: Option<String>) {
        if let Some(link) = link {
            if self.seen.insert(link.clone()) {
                self.links.push(link);
            }
        }
    }

    fn finish(self) -> Vec<String> {
        self.links
    }
}

/// Collapses runs of whitespace into single spaces and trims
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to at most `max` characters, on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/docs/page").unwrap()
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let html = "<html><head><title>  Test \n Page  </title></head><body></body></html>";
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let parsed = parse_html("<html><head></head><body></body></html>", &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_description_is_first_nonempty_paragraph() {
        let html = "<body><p> </p><p>First  real\nparagraph.</p><p>Second.</p></body>";
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.description.as_deref(), Some("First real paragraph."));
    }

    #[test]
    fn test_description_is_capped() {
        let long = "word ".repeat(200);
        let html = format!("<body><p>{}</p></body>", long);
        let parsed = parse_html(&html, &base_url());
        assert!(parsed.description.unwrap().chars().count() <= MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_extract_relative_links() {
        let html = r#"<body><a href="/other">A</a><a href="sibling">B</a><a href="../up">C</a></body>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(
            parsed.links,
            vec![
                "https://example.com/other",
                "https://example.com/docs/sibling",
                "https://example.com/up",
            ]
        );
    }

    #[test]
    fn test_relative_links_on_directory_page() {
        let base = Url::parse("https://example.com/docs/").unwrap();
        let html = r#"<body><a href="intro">A</a><a href="./guide/setup">B</a><a href="../blog">C</a></body>"#;
        assert_eq!(
            parse_html(html, &base).links,
            vec![
                "https://example.com/docs/intro",
                "https://example.com/docs/guide/setup",
                "https://example.com/blog",
            ]
        );
        assert_eq!(
            extract_markdown_links("[intro](intro) [up](../up)", &base),
            vec!["https://example.com/docs/intro", "https://example.com/up"]
        );
    }

    #[test]
    fn test_skip_special_links() {
        let html = r##"<body>
            <a href="javascript:void(0)">js</a>
            <a href="MAILTO:test@example.com">mail</a>
            <a href="tel:+1234567890">tel</a>
            <a href="data:text/html,<h1>x</h1>">data</a>
            <a href="#section">jump</a>
            <a href="/file.pdf" download>dl</a>
            <a href="ftp://example.com/file">ftp</a>
        </body>"##;
        let parsed = parse_html(html, &base_url());
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn test_fragments_stripped_and_deduplicated_in_order() {
        let html = r##"<body>
            <a href="/b#one">b1</a>
            <a href="/a">a</a>
            <a href="/b#two">b2</a>
            <a href="/b">b3</a>
        </body>"##;
        let parsed = parse_html(html, &base_url());
        assert_eq!(
            parsed.links,
            vec!["https://example.com/b", "https://example.com/a"]
        );
    }

    #[test]
    fn test_extract_markdown_links() {
        let md = "See [intro](/docs/intro) and [ref](ref \"Reference\").\n\
                  <a href=\"/docs/raw\">raw</a> and [mail](mailto:x@y.z) [top](#top)";
        let links = extract_markdown_links(md, &base_url());
        assert_eq!(
            links,
            vec![
                "https://example.com/docs/intro",
                "https://example.com/docs/ref",
                "https://example.com/docs/raw",
            ]
        );
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
