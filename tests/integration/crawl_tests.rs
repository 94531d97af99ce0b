//! Integration tests for the export pipeline
//!
//! These tests use wiremock to serve a small documentation site and run the
//! full crawl, index and packaging cycle end-to-end.

use llms_scraper::config::{Config, IndexMode};
use llms_scraper::crawler::{crawl_with_services, CrawlServices};
use llms_scraper::extract::{RenderedPage, Renderer};
use llms_scraper::state::PageState;
use llms_scraper::{ExportSummary, ScraperError};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wraps body HTML in a page with a title and a `<main>` region
fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><nav>Site menu</nav><main>{}</main></body></html>",
        title, body
    )
}

async fn serve(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

async fn serve_robots(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Creates a test configuration exporting into `dir/export`
fn create_test_config(seeds: Vec<String>, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawl.seeds = seeds;
    config.crawl.concurrency = 3;
    config.crawl.max_pages = 50;
    config.output.directory = dir.path().join("export");
    config.output.create_zip = false;
    config.fetch.request_timeout_secs = 5;
    config.fetch.render_timeout_secs = 5;
    config
}

async fn run(config: &Config) -> ExportSummary {
    let services = CrawlServices::http(config).expect("Failed to build services");
    crawl_with_services(config, services)
        .await
        .expect("Crawl failed")
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).expect("Failed to read export file")
}

#[tokio::test]
async fn test_prefix_scoped_crawl_respects_budget() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve_robots(&server, ResponseTemplate::new(404)).await;
    serve(
        &server,
        "/api",
        html_page(
            "API",
            r#"<h1>API</h1>
               <a href="/api/a">A</a> <a href="/api/b">B</a> <a href="/api/c">C</a>
               <a href="/api/d">D</a> <a href="/api/e">E</a> <a href="/api/f">F</a>
               <a href="/guide">Guide</a>
               <a href="https://elsewhere.test/api/x">Elsewhere</a>"#,
        ),
    )
    .await;
    for name in ["a", "b", "c", "d", "e", "f"] {
        serve(
            &server,
            &format!("/api/{}", name),
            html_page(name, &format!("<p>Endpoint {} docs. GET /{}</p>", name, name)),
        )
        .await;
    }
    serve(&server, "/guide", html_page("Guide", "<p>Guide page.</p>")).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(vec![format!("{}/api", base)], &dir);
    config.crawl.path_prefix = Some("/api".to_string());
    config.crawl.max_pages = 5;

    let summary = run(&config).await;
    let records: Vec<_> = summary.report.repository.iter().collect();

    assert_eq!(records.len(), 5);
    for (i, record) in records.iter().enumerate() {
        let url = url::Url::parse(&record.source_url).unwrap();
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert!(url.path().starts_with("/api"), "{}", record.source_url);
        assert_eq!(record.visit_order, i);
    }

    let paths: Vec<&str> = records.iter().map(|r| r.output_path.as_str()).collect();
    assert_eq!(paths, vec!["api.md", "api/a.md", "api/b.md", "api/c.md", "api/d.md"]);
    assert!(summary.report.frontier_remaining > 0);

    let page = read(dir.path().join("export/api/a.md"));
    assert!(page.starts_with(&format!("# a\n\n> Source: {}/api/a\n\n", base)));
    assert!(!page.contains("Site menu"));
}

#[tokio::test]
async fn test_renderer_failure_falls_back_to_raw_html() {
    struct BrokenRenderer;

    #[async_trait::async_trait]
    impl Renderer for BrokenRenderer {
        async fn render(&self, url: &str) -> llms_scraper::Result<RenderedPage> {
            Err(ScraperError::Render {
                url: url.to_string(),
                message: "browser crashed".to_string(),
            })
        }
    }

    let server = MockServer::start().await;
    let base = server.uri();
    serve_robots(&server, ResponseTemplate::new(404)).await;
    serve(
        &server,
        "/manual",
        html_page("Manual", "<h1>Manual</h1><p>Fallback body text.</p>"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(vec![format!("{}/manual", base)], &dir);
    let services = CrawlServices {
        renderer: Arc::new(BrokenRenderer),
        ..CrawlServices::http(&config).unwrap()
    };
    let summary = crawl_with_services(&config, services).await.unwrap();

    assert_eq!(summary.report.repository.len(), 1);
    let record = &summary.report.repository.records()[0];
    assert!(record.degraded);
    assert_eq!(record.title, "Manual");
    assert!(record.markdown_body.contains("Fallback body text."));
    assert_eq!(summary.report.count(PageState::Degraded), 1);
}

#[tokio::test]
async fn test_robots_failure_is_fail_open() {
    let server = MockServer::start().await;
    let base = server.uri();
    serve_robots(&server, ResponseTemplate::new(500)).await;
    serve(
        &server,
        "/",
        html_page("Home", r#"<p>Welcome.</p><a href="/next">Next</a>"#),
    )
    .await;
    serve(&server, "/next", html_page("Next", "<p>Second page.</p>")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(vec![format!("{}/", base)], &dir);
    let summary = run(&config).await;

    let paths: Vec<&str> = summary
        .report
        .repository
        .iter()
        .map(|r| r.output_path.as_str())
        .collect();
    assert_eq!(paths, vec!["root.md", "next.md"]);
    assert_eq!(summary.report.count(PageState::RobotsDenied), 0);
}

#[tokio::test]
async fn test_forbidden_robots_still_exports() {
    let server = MockServer::start().await;
    let base = server.uri();
    serve_robots(&server, ResponseTemplate::new(403)).await;
    serve(
        &server,
        "/docs",
        html_page("Docs", r#"<p>Behind a bot wall.</p><a href="/docs/more">More</a>"#),
    )
    .await;
    serve(&server, "/docs/more", html_page("More", "<p>More docs.</p>")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(vec![format!("{}/docs", base)], &dir);
    let summary = run(&config).await;

    assert_eq!(summary.report.repository.len(), 2);
    assert_eq!(summary.report.count(PageState::RobotsDenied), 0);
    assert!(dir.path().join("export/docs.md").exists());
}

#[tokio::test]
async fn test_robots_disallow_is_respected() {
    let server = MockServer::start().await;
    let base = server.uri();
    serve_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
    )
    .await;
    serve(
        &server,
        "/",
        html_page(
            "Home",
            r#"<p>Welcome.</p><a href="/private/keys">Keys</a><a href="/public">Public</a>"#,
        ),
    )
    .await;
    serve(&server, "/public", html_page("Public", "<p>Open docs.</p>")).await;
    serve(&server, "/private/keys", html_page("Keys", "<p>Secret.</p>")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(vec![format!("{}/", base)], &dir);
    let summary = run(&config).await;

    let sources: HashSet<String> = summary
        .report
        .repository
        .iter()
        .map(|r| r.source_url.clone())
        .collect();
    assert!(sources.contains(&format!("{}/public", base)));
    assert!(!sources.contains(&format!("{}/private/keys", base)));
    assert_eq!(summary.report.count(PageState::RobotsDenied), 1);
    assert!(!dir.path().join("export/private/keys.md").exists());
}

#[tokio::test]
async fn test_relative_links_follow_redirected_directory_pages() {
    let server = MockServer::start().await;
    let base = server.uri();
    serve_robots(&server, ResponseTemplate::new(404)).await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/docs/", base).as_str()),
        )
        .mount(&server)
        .await;
    serve(
        &server,
        "/docs/",
        html_page(
            "Docs",
            r#"<p>Docs home.</p>
               <a href="intro">Intro</a> <a href="guide/">Guide</a> <a href="../outside">Out</a>"#,
        ),
    )
    .await;
    serve(
        &server,
        "/docs/intro",
        html_page("Intro", r#"<p>Intro page.</p><a href="../docs/">Home</a>"#),
    )
    .await;
    serve(
        &server,
        "/docs/guide/",
        html_page("Guide", r#"<p>Guide index.</p><a href="../reference">Reference</a>"#),
    )
    .await;
    serve(&server, "/docs/reference", html_page("Reference", "<p>Reference page.</p>")).await;
    serve(&server, "/outside", html_page("Outside", "<p>Not docs.</p>")).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(vec![format!("{}/docs", base)], &dir);
    config.crawl.path_prefix = Some("/docs".to_string());
    let summary = run(&config).await;

    let sources: Vec<&str> = summary
        .report
        .repository
        .iter()
        .map(|r| r.source_url.as_str())
        .collect();
    assert_eq!(
        sources,
        vec![
            format!("{}/docs", base),
            format!("{}/docs/intro", base),
            format!("{}/docs/guide/", base),
            format!("{}/docs/reference", base),
        ]
    );

    let paths: Vec<&str> = summary
        .report
        .repository
        .iter()
        .map(|r| r.output_path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec!["docs.md", "docs/intro.md", "docs/guide.md", "docs/reference.md"]
    );
}

#[tokio::test]
async fn test_trailing_slash_seed_resolves_relative_links() {
    let server = MockServer::start().await;
    let base = server.uri();
    serve_robots(&server, ResponseTemplate::new(404)).await;
    serve(
        &server,
        "/docs/",
        html_page("Docs", r#"<p>Docs home.</p><a href="intro">Intro</a>"#),
    )
    .await;
    serve(&server, "/docs/intro", html_page("Intro", "<p>Intro page.</p>")).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(vec![format!("{}/docs/", base)], &dir);
    config.crawl.path_prefix = Some("/docs".to_string());
    let summary = run(&config).await;

    assert_eq!(summary.report.repository.len(), 2);
    assert!(summary
        .report
        .repository
        .find_by_path("docs/intro.md")
        .is_some());
}

#[tokio::test]
async fn test_fragment_seed_gets_its_own_file() {
    let server = MockServer::start().await;
    let base = server.uri();
    serve_robots(&server, ResponseTemplate::new(404)).await;
    serve(
        &server,
        "/doc",
        html_page(
            "Doc Page",
            r#"<h1>Doc</h1><p>Intro text.</p>
               <h2 id="sec1">Section One</h2><p>Inside one.</p>
               <h2 id="sec2">Section Two</h2><p>Inside two.</p>"#,
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        vec![format!("{}/doc", base), format!("{}/doc#sec1", base)],
        &dir,
    );
    let summary = run(&config).await;

    let repository = &summary.report.repository;
    assert_eq!(repository.len(), 2);

    let whole = repository.find_by_path("doc.md").expect("whole page");
    let section = repository.find_by_path("doc__sec1.md").expect("fragment page");
    assert_ne!(whole.output_path, section.output_path);
    assert!(section.is_fragment);
    assert_eq!(section.title, "Doc Page - Section One");
    assert!(section.markdown_body.contains("Inside one."));
    assert!(!section.markdown_body.contains("Inside two."));

    let file = read(dir.path().join("export/doc__sec1.md"));
    assert!(file.contains(&format!("> Source: {}/doc#sec1\n", base)));
}

#[tokio::test]
async fn test_indexes_are_complete_and_archive_is_written() {
    let server = MockServer::start().await;
    let base = server.uri();
    serve_robots(&server, ResponseTemplate::new(404)).await;
    serve(
        &server,
        "/",
        html_page(
            "Home",
            r#"<p>Start here.</p><a href="/guide/intro">Intro</a><a href="/api/users">Users</a>"#,
        ),
    )
    .await;
    serve(
        &server,
        "/guide/intro",
        html_page("Intro | Guide", "<h2>Overview</h2><p>The guide.</p>"),
    )
    .await;
    serve(
        &server,
        "/api/users",
        html_page("Users", "<h2>List</h2><p>GET /users returns users. POST /users creates one.</p>"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(vec![format!("{}/", base)], &dir);
    config.output.index_mode = IndexMode::Both;
    config.output.create_zip = true;
    config.output.zip_name = Some("site".to_string());

    let summary = run(&config).await;
    let export = dir.path().join("export");
    assert_eq!(summary.report.repository.len(), 3);

    let llms = read(export.join("llms.txt"));
    let standard = read(export.join("llms_index.md"));
    let extended = read(export.join("llms_index_extended.md"));
    let sitemap = read(export.join("sitemap.md"));
    assert!(export.join("llms_ai_index.md").exists());

    assert!(llms.starts_with("# 127.0.0.1 docs index\n"));
    for record in summary.report.repository.iter() {
        let link = format!("]({})", record.output_path);
        assert_eq!(llms.matches(&link).count(), 1, "{}", record.output_path);
        assert_eq!(sitemap.matches(&link).count(), 1, "{}", record.output_path);

        let cell = format!("| {} |", record.output_path);
        assert_eq!(standard.matches(&cell).count(), 1, "{}", record.output_path);
        assert_eq!(extended.matches(&cell).count(), 1, "{}", record.output_path);
    }

    assert!(standard.contains("| Intro \\| Guide | guide/intro.md |"));
    assert!(extended.contains("| List | GET /users; POST /users |"));
    assert!(sitemap.contains("\n### guide/\n\n- [Intro | Guide](guide/intro.md)\n"));

    let archive = summary.archive.expect("archive path");
    assert_eq!(archive, dir.path().join("site.zip"));
    let zip = zip::ZipArchive::new(std::fs::File::open(&archive).unwrap()).unwrap();
    let names: HashSet<&str> = zip.file_names().collect();
    assert!(names.contains("llms.txt"));
    assert!(names.contains("guide/intro.md"));
    assert!(names.contains("api/users.md"));
}

#[tokio::test]
async fn test_invalid_seed_aborts_before_crawling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        vec![format!("{}/ok", server.uri()), "ftp://files.test/docs".to_string()],
        &dir,
    );
    let services = CrawlServices::http(&config).unwrap();
    let result = crawl_with_services(&config, services).await;

    assert!(matches!(result, Err(ScraperError::Config(_))));
    assert!(!dir.path().join("export").exists());
}
