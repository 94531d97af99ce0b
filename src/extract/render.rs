//! Page rendering capability
//!
//! A renderer turns a URL into a title and a Markdown body. The default
//! implementation works on the static HTML; anything that drives a real
//! browser can be plugged in behind the same trait.

use crate::crawler::{collapse_whitespace, FetchedPage, Fetcher};
use crate::{Result, ScraperError};
use scraper::{Html, Selector};
use std::sync::Arc;

/// Selectors tried in order to find the main content region
const CONTENT_SELECTORS: &[&str] = &["main", "article", "[role='main']", "body"];

/// Output of a successful render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub title: Option<String>,
    pub markdown: String,
    /// Source HTML the renderer worked from, when it has one
    pub html: Option<String>,
    /// URL the content was finally served from, after redirects
    pub final_url: Option<String>,
}

#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<RenderedPage>;

    /// Renders a page whose HTML was already downloaded
    ///
    /// Renderers that need a live page return `None` and are called through
    /// [`Renderer::render`] instead.
    fn render_fetched(&self, _page: &FetchedPage) -> Option<Result<RenderedPage>> {
        None
    }
}

/// Renders the served HTML: keeps the main content region and converts it with html2md
#[derive(Clone)]
pub struct StaticHtmlRenderer {
    fetcher: Arc<dyn Fetcher>,
}

impl StaticHtmlRenderer {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl Renderer for StaticHtmlRenderer {
    async fn render(&self, url: &str) -> Result<RenderedPage> {
        let page = self.fetcher.fetch(url).await?;
        render_html(page)
    }

    fn render_fetched(&self, page: &FetchedPage) -> Option<Result<RenderedPage>> {
        Some(render_html(page.clone()))
    }
}

fn render_html(page: FetchedPage) -> Result<RenderedPage> {
    let FetchedPage { final_url, body } = page;
    let (title, content_html) = main_content(&body);

    let markdown = html2md::parse_html(&content_html).trim().to_string();
    if markdown.is_empty() {
        return Err(ScraperError::Render {
            url: final_url,
            message: "no content in main region".to_string(),
        });
    }

    Ok(RenderedPage {
        title,
        markdown,
        html: Some(body),
        final_url: Some(final_url),
    })
}

/// Returns the document title and the inner HTML of its main content region
pub fn main_content(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        })
        .filter(|t| !t.is_empty());

    for selector in CONTENT_SELECTORS {
        if let Ok(sel) = Selector::parse(selector) {
            if let Some(node) = document.select(&sel).next() {
                return (title, node.inner_html());
            }
        }
    }

    (title, document.root_element().html())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticPage(&'static str);

    #[async_trait::async_trait]
    impl Fetcher for StaticPage {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                final_url: url.to_string(),
                body: self.0.to_string(),
            })
        }
    }

    #[test]
    fn test_main_content_prefers_main() {
        let html = "<html><head><title>T</title></head><body><nav>menu</nav>\
                    <main><h1>Hello</h1></main></body></html>";
        let (title, content) = main_content(html);
        assert_eq!(title.as_deref(), Some("T"));
        assert!(content.contains("Hello"));
        assert!(!content.contains("menu"));
    }

    #[test]
    fn test_main_content_falls_back_to_body() {
        let (title, content) = main_content("<body><p>Only body</p></body>");
        assert_eq!(title, None);
        assert!(content.contains("Only body"));
    }

    #[tokio::test]
    async fn test_render_produces_markdown() {
        let renderer = StaticHtmlRenderer::new(Arc::new(StaticPage(
            "<html><head><title>Users API</title></head>\
             <body><article><h2>List</h2><p>GET /users returns users.</p></article></body></html>",
        )));
        let page = renderer.render("https://x.test/api/users").await.unwrap();
        assert_eq!(page.title.as_deref(), Some("Users API"));
        assert!(page.markdown.contains("List"));
        assert!(page.markdown.contains("GET /users"));
        assert!(page.html.is_some());
        assert_eq!(page.final_url.as_deref(), Some("https://x.test/api/users"));
    }

    #[test]
    fn test_render_fetched_reuses_downloaded_html() {
        let renderer = StaticHtmlRenderer::new(Arc::new(StaticPage("<p>unused</p>")));
        let page = FetchedPage {
            final_url: "https://x.test/docs/".to_string(),
            body: "<html><body><main><p>Already here.</p></main></body></html>".to_string(),
        };

        let rendered = renderer.render_fetched(&page).unwrap().unwrap();
        assert!(rendered.markdown.contains("Already here."));
        assert_eq!(rendered.final_url.as_deref(), Some("https://x.test/docs/"));
    }

    #[tokio::test]
    async fn test_render_empty_page_fails() {
        let renderer = StaticHtmlRenderer::new(Arc::new(StaticPage("<html><body></body></html>")));
        let result = renderer.render("https://x.test/empty").await;
        assert!(matches!(result, Err(ScraperError::Render { .. })));
    }
}
