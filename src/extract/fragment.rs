//! Fragment-anchor slicing
//!
//! Isolates the part of a page that a `#fragment` points at: the heading that
//! owns the anchor plus everything after it up to the next heading of the same
//! or a higher level.

use crate::crawler::collapse_whitespace;
use scraper::{ElementRef, Html};

/// Level assumed for an anchor that has no heading around it
const NO_HEADING_LEVEL: u8 = 6;

/// The HTML of one page section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSection {
    /// Text of the heading that starts the section
    pub heading: Option<String>,
    pub html: String,
}

/// Slices the section identified by `fragment` out of `html`
///
/// The anchor is the first element whose `id` or `name` equals the fragment.
/// Returns `None` when the page has no such element.
///
/// # Example
///
/// ```
/// use llms_scraper::extract::slice_fragment_section;
///
/// let html = r#"<h2 id="auth">Auth</h2><p>Use tokens.</p><h2 id="next">Next</h2>"#;
/// let section = slice_fragment_section(html, "auth").unwrap();
/// assert_eq!(section.heading.as_deref(), Some("Auth"));
/// assert!(section.html.contains("Use tokens."));
/// assert!(!section.html.contains("Next"));
/// ```
pub fn slice_fragment_section(html: &str, fragment: &str) -> Option<FragmentSection> {
    let document = Html::parse_document(html);

    let anchor = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| {
            el.value().attr("id") == Some(fragment) || el.value().attr("name") == Some(fragment)
        })?;

    let heading = if heading_level(&anchor).is_some() {
        Some(anchor)
    } else {
        anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| heading_level(el).is_some())
    };

    let start = heading.unwrap_or(anchor);
    let level = heading
        .as_ref()
        .and_then(heading_level)
        .unwrap_or(NO_HEADING_LEVEL);

    let mut section = start.html();
    for sibling in start.next_siblings() {
        if let Some(el) = ElementRef::wrap(sibling) {
            if matches!(heading_level(&el), Some(l) if l <= level) {
                break;
            }
            section.push_str(&el.html());
        } else if let Some(text) = sibling.value().as_text() {
            section.push_str(&escape_text(text));
        }
    }

    Some(FragmentSection {
        heading: heading
            .map(|h| collapse_whitespace(&h.text().collect::<String>()))
            .filter(|t| !t.is_empty()),
        html: section,
    })
}

/// `h1`..`h6` -> 1..6
fn heading_level(el: &ElementRef) -> Option<u8> {
    let name = el.value().name();
    let mut chars = name.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('h'), Some(digit @ '1'..='6'), None) => digit.to_digit(10).map(|d| d as u8),
        _ => None,
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
