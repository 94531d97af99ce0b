/// Plain HTML to Markdown conversion used when the renderer fails
///
/// Pure and synchronous; never touches the network.
pub trait FallbackConverter: Send + Sync {
    fn convert(&self, html: &str) -> String;
}

/// Converts the whole document with html2md
#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdFallback;

impl FallbackConverter for Html2MdFallback {
    fn convert(&self, html: &str) -> String {
        html2md::parse_html(html).trim().to_string()
    }
}
