use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use sitemap_app::{run_session, CrawlReport, SessionOptions};
use sitemap_core::{CrawlConfig, SessionState};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn page(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

async fn mock_site() -> MockServer {
    let server = MockServer::start().await;
    page(
        &server,
        "/site/",
        r#"<a href="guide">Guide</a> <a href="/site/about#team">About</a>
           <a href="/outside">Outside</a> <a href="logo.png">Logo</a>
           <a href="/site/old">Old</a> <a href="/site/missing">Missing</a>"#,
    )
    .await;
    page(&server, "/site/guide", r#"<a href="/site/">Home</a>"#).await;
    page(
        &server,
        "/site/about",
        r#"<meta name="robots" content="noindex"><a href="/site/guide">Guide</a>"#,
    )
    .await;
    page(&server, "/site/new", "<p>moved here</p>").await;
    Mock::given(method("GET"))
        .and(path("/site/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/site/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/site/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("gone", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/site/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 4], "image/png"))
        .expect(0)
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread")]
async fn crawls_mock_site_into_sitemap_and_report() {
    let server = mock_site().await;
    let base = format!("{}/site/", server.uri());
    let temp = TempDir::new().unwrap();

    let mut options = SessionOptions::new(
        CrawlConfig::new(&base).unwrap(),
        temp.path().to_path_buf(),
    );
    options.crawl.concurrency = 2;
    options.crawl.drain_interval = Duration::from_millis(20);
    options.crawl.close_poll_interval = Duration::from_millis(20);
    options.write_report = true;

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        run_session(options, move |status| {
            assert_eq!(status.state, SessionState::Complete);
            counter.fetch_add(1, Ordering::SeqCst);
        })
    })
    .await
    .unwrap()
    .expect("session completes");

    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.status.state, SessionState::Complete);
    assert_eq!(
        outcome.success,
        vec![
            base.clone(),
            format!("{base}guide"),
            format!("{base}new"),
        ]
    );
    assert_eq!(outcome.errors, vec![format!("{base}missing")]);

    let sitemap = fs::read_to_string(outcome.sitemap_path.expect("sitemap written")).unwrap();
    assert!(sitemap.contains(&format!("<loc>{base}guide</loc>")));
    assert!(!sitemap.contains("about"));
    assert!(!sitemap.contains("missing"));
    assert!(!sitemap.contains("outside"));

    let report: CrawlReport =
        serde_json::from_str(&fs::read_to_string(outcome.report_path.unwrap()).unwrap()).unwrap();
    assert_eq!(report.success_count, 3);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.errors, vec![format!("{base}missing")]);
}
