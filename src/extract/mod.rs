//! Extraction dispatcher
//!
//! Turns an eligible URL into a title, a Markdown body, the links it points
//! to, and derived metrics:
//! - the renderer is tried first, bounded by a timeout
//! - on renderer failure the raw HTML is fetched and converted by the fallback
//! - `#fragment` requests are sliced down to the anchored section when possible
//!
//! Links are resolved against the URL a page was finally served from, so a
//! redirect from `/docs` to `/docs/` gives `intro` the base `/docs/`.

mod fallback;
mod fragment;
mod metrics;
mod render;

pub use fallback::{FallbackConverter, Html2MdFallback};
pub use fragment::{slice_fragment_section, FragmentSection};
pub use metrics::{
    detect_endpoints, first_h1_heading, first_h2_heading, read_minutes, summarize, word_count,
    PageMetrics,
};
pub use render::{main_content, RenderedPage, Renderer, StaticHtmlRenderer};

use crate::crawler::{extract_markdown_links, parse_html, FetchedPage, Fetcher};
use crate::{Result, ScraperError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Title used when nothing better is available
pub const UNTITLED: &str = "Untitled";

/// How the Markdown body of a page was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Renderer output
    Rendered,
    /// Fallback conversion of the raw HTML after a renderer failure
    Fallback,
    /// Fallback conversion of the section a fragment anchors
    FragmentSlice,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rendered => "rendered",
            Self::Fallback => "fallback",
            Self::FragmentSlice => "fragment",
        };
        f.write_str(name)
    }
}

/// Everything extracted from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub title: String,
    pub markdown: String,
    pub method: ExtractionMethod,
    /// Absolute, fragment-free follow-up URLs in order of appearance
    pub links: Vec<String>,
    pub metrics: PageMetrics,
    pub summary: Option<String>,
}

impl Extraction {
    pub fn is_degraded(&self) -> bool {
        self.method == ExtractionMethod::Fallback
    }
}

/// Capabilities and settings the dispatcher runs with
#[derive(Clone)]
pub struct ExtractionDispatcher {
    renderer: Arc<dyn Renderer>,
    fallback: Arc<dyn FallbackConverter>,
    fetcher: Arc<dyn Fetcher>,
    render_timeout: Duration,
    export_fragments: bool,
}

impl ExtractionDispatcher {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        fallback: Arc<dyn FallbackConverter>,
        fetcher: Arc<dyn Fetcher>,
        render_timeout: Duration,
        export_fragments: bool,
    ) -> Self {
        Self {
            renderer,
            fallback,
            fetcher,
            render_timeout,
            export_fragments,
        }
    }

    /// Extracts one page
    ///
    /// # Arguments
    ///
    /// * `url` - Normalized page URL, without fragment
    /// * `fragment` - Section to isolate; ignored when fragment export is off
    ///
    /// # Returns
    ///
    /// * `Ok(Extraction)` - Page content, possibly degraded
    /// * `Err(ScraperError)` - Both the renderer and the raw fetch failed
    pub async fn extract(&self, url: &Url, fragment: Option<&str>) -> Result<Extraction> {
        let mut raw: Option<FetchedPage> = None;

        if let Some(fragment) = fragment.filter(|_| self.export_fragments) {
            match self.fetcher.fetch(url.as_str()).await {
                Ok(page) => {
                    if let Some(extraction) = self.extract_fragment(url, fragment, &page) {
                        return Ok(extraction);
                    }
                    tracing::debug!("Anchor #{} not found on {}, using full page", fragment, url);
                    raw = Some(page);
                }
                Err(e) => {
                    tracing::debug!("Raw fetch for fragment slicing failed on {}: {}", url, e)
                }
            }
        }

        let rendered = match raw.as_ref().and_then(|page| self.renderer.render_fetched(page)) {
            Some(result) => result.and_then(|rendered| non_empty(url, rendered)),
            None => self.render(url).await,
        };

        match rendered {
            Ok(rendered) => Ok(self.from_rendered(url, rendered, raw)),
            Err(e) => {
                tracing::warn!("Renderer failed for {}, using fallback conversion: {}", url, e);
                let page = match raw {
                    Some(page) => page,
                    None => self.fetcher.fetch(url.as_str()).await?,
                };
                self.from_fallback(url, &page)
            }
        }
    }

    async fn render(&self, url: &Url) -> Result<RenderedPage> {
        let rendered = tokio::time::timeout(self.render_timeout, self.renderer.render(url.as_str()))
            .await
            .map_err(|_| ScraperError::Render {
                url: url.to_string(),
                message: format!("timed out after {}s", self.render_timeout.as_secs()),
            })??;

        non_empty(url, rendered)
    }

    fn extract_fragment(&self, url: &Url, fragment: &str, page: &FetchedPage) -> Option<Extraction> {
        let section = slice_fragment_section(&page.body, fragment)?;
        let markdown = self.fallback.convert(&section.html);
        if markdown.trim().is_empty() {
            return None;
        }

        let parsed = parse_html(&page.body, &link_base(url, Some(&page.final_url)));
        let base_title = parsed
            .title
            .or_else(|| first_h1_heading(&markdown))
            .unwrap_or_else(|| UNTITLED.to_string());
        let title = match &section.heading {
            Some(heading) if *heading != base_title => format!("{} - {}", base_title, heading),
            _ => base_title,
        };

        Some(Extraction {
            title,
            metrics: PageMetrics::compute(&markdown),
            summary: summarize(&markdown).or(parsed.description),
            markdown,
            method: ExtractionMethod::FragmentSlice,
            links: parsed.links,
        })
    }

    fn from_rendered(&self, url: &Url, rendered: RenderedPage, raw: Option<FetchedPage>) -> Extraction {
        let rendered_base = link_base(url, rendered.final_url.as_deref());
        let source = match rendered.html {
            Some(html) => Some((html, rendered_base.clone())),
            None => raw.map(|page| {
                let base = link_base(url, Some(&page.final_url));
                (page.body, base)
            }),
        };
        let parsed = source.as_ref().map(|(html, base)| parse_html(html, base));

        let links = match &parsed {
            Some(parsed) => parsed.links.clone(),
            None => extract_markdown_links(&rendered.markdown, &rendered_base),
        };

        let title = rendered
            .title
            .filter(|t| !t.trim().is_empty())
            .or_else(|| parsed.as_ref().and_then(|p| p.title.clone()))
            .or_else(|| first_h1_heading(&rendered.markdown))
            .unwrap_or_else(|| UNTITLED.to_string());

        let summary = parsed
            .and_then(|p| p.description)
            .or_else(|| summarize(&rendered.markdown));

        Extraction {
            title,
            metrics: PageMetrics::compute(&rendered.markdown),
            summary,
            markdown: rendered.markdown,
            method: ExtractionMethod::Rendered,
            links,
        }
    }

    fn from_fallback(&self, url: &Url, page: &FetchedPage) -> Result<Extraction> {
        let markdown = self.fallback.convert(&page.body);
        if markdown.trim().is_empty() {
            return Err(ScraperError::Extraction {
                url: url.to_string(),
                message: "fallback conversion produced no content".to_string(),
            });
        }

        let parsed = parse_html(&page.body, &link_base(url, Some(&page.final_url)));
        let title = parsed
            .title
            .or_else(|| first_h1_heading(&markdown))
            .unwrap_or_else(|| UNTITLED.to_string());

        Ok(Extraction {
            title,
            metrics: PageMetrics::compute(&markdown),
            summary: parsed.description.or_else(|| summarize(&markdown)),
            markdown,
            method: ExtractionMethod::Fallback,
            links: parsed.links,
        })
    }
}

fn non_empty(url: &Url, rendered: RenderedPage) -> Result<RenderedPage> {
    if rendered.markdown.trim().is_empty() {
        return Err(ScraperError::Render {
            url: url.to_string(),
            message: "empty markdown".to_string(),
        });
    }
    Ok(rendered)
}

/// Base for relative links: the served URL when known, the requested one otherwise
fn link_base(url: &Url, final_url: Option<&str>) -> Url {
    final_url
        .and_then(|served| Url::parse(served).ok())
        .unwrap_or_else(|| url.clone())
}

impl fmt::Debug for ExtractionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionDispatcher")
            .field("render_timeout", &self.render_timeout)
            .field("export_fragments", &self.export_fragments)
            .finish_non_exhaustive()
    }
}
