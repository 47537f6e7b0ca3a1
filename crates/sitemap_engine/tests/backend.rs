use std::time::Duration;

use pretty_assertions::assert_eq;
use sitemap_engine::{BackendError, BackendSettings, HeaderOutcome, HttpBackend, RenderBackend};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn open_backend() -> HttpBackend {
    let backend = HttpBackend::new(BackendSettings::default()).expect("client");
    backend.open_context().await.expect("context");
    backend
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

#[tokio::test]
async fn html_page_reports_headers_and_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(html(
            r#"<a href="intro">Intro</a><a href="/about">About</a><a href="intro">Dup</a>"#,
        ))
        .mount(&server)
        .await;

    let backend = open_backend().await;
    let url = format!("{}/docs/", server.uri());
    backend.open_page(1, &url).await.expect("open");

    let outcome = backend.observe_headers(1).await.expect("headers");
    assert_eq!(
        outcome,
        HeaderOutcome::Response {
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
        }
    );

    let report = backend.inject_agent(1).await.expect("agent");
    assert_eq!(report.origin, url);
    assert_eq!(
        report.links,
        vec![
            format!("{}/docs/intro", server.uri()),
            format!("{}/about", server.uri()),
        ]
    );
    assert_eq!(report.exclude_self, None);
}

#[tokio::test]
async fn error_status_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("nope", "text/html"))
        .mount(&server)
        .await;

    let backend = open_backend().await;
    backend
        .open_page(2, &format!("{}/missing", server.uri()))
        .await
        .unwrap();

    let outcome = backend.observe_headers(2).await.unwrap();
    assert_eq!(
        outcome,
        HeaderOutcome::Response {
            status: 404,
            content_type: Some("text/html".to_string()),
        }
    );
}

#[tokio::test]
async fn redirects_are_reported_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new?from=old"))
        .mount(&server)
        .await;

    let backend = open_backend().await;
    backend
        .open_page(3, &format!("{}/old", server.uri()))
        .await
        .unwrap();

    let outcome = backend.observe_headers(3).await.unwrap();
    assert_eq!(
        outcome,
        HeaderOutcome::Redirect {
            target: format!("{}/new?from=old", server.uri()),
        }
    );
}

#[tokio::test]
async fn not_modified_without_location_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let backend = open_backend().await;
    backend
        .open_page(4, &format!("{}/cached", server.uri()))
        .await
        .unwrap();

    match backend.observe_headers(4).await.unwrap() {
        HeaderOutcome::Response { status, .. } => assert_eq!(status, 304),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn robots_meta_reaches_the_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html(
            r#"<head><meta name="robots" content="noindex,nofollow"></head><a href="/x">x</a>"#,
        ))
        .mount(&server)
        .await;

    let backend = open_backend().await;
    let url = format!("{}/private", server.uri());
    backend.open_page(5, &url).await.unwrap();
    backend.observe_headers(5).await.unwrap();

    let report = backend.inject_agent(5).await.unwrap();
    assert_eq!(report.exclude_self, Some(url));
    assert!(report.links.is_empty());
}

#[tokio::test]
async fn closing_cancels_a_pending_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>late</p>").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let backend = std::sync::Arc::new(open_backend().await);
    backend
        .open_page(6, &format!("{}/slow", server.uri()))
        .await
        .unwrap();

    let observer = {
        let backend = backend.clone();
        tokio::spawn(async move { backend.observe_headers(6).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    backend.close_page(6).await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), observer)
        .await
        .expect("cancelled promptly")
        .expect("task");
    assert_eq!(result, Err(BackendError::PageClosed(6)));
    assert_eq!(backend.query_open_count().await, 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(html("0123456789abcdef"))
        .mount(&server)
        .await;

    let settings = BackendSettings {
        max_bytes: 10,
        ..BackendSettings::default()
    };
    let backend = HttpBackend::new(settings).unwrap();
    backend.open_context().await.unwrap();
    backend
        .open_page(7, &format!("{}/large", server.uri()))
        .await
        .unwrap();
    backend.observe_headers(7).await.unwrap();

    let err = backend.inject_agent(7).await.unwrap_err();
    assert_eq!(
        err,
        BackendError::TooLarge {
            max_bytes: 10,
            actual: Some(16)
        }
    );
}

#[tokio::test]
async fn page_table_tracks_open_pages() {
    let backend = HttpBackend::new(BackendSettings::default()).unwrap();
    assert_eq!(
        backend.open_page(1, "https://x.test/").await,
        Err(BackendError::ContextClosed)
    );

    backend.open_context().await.unwrap();
    backend.open_page(1, "https://x.test/").await.unwrap();
    backend.open_page(2, "https://x.test/a").await.unwrap();
    assert_eq!(
        backend.open_page(2, "https://x.test/a").await,
        Err(BackendError::DuplicatePage(2))
    );
    assert_eq!(backend.query_open_count().await, 2);

    backend.close_page(1).await.unwrap();
    backend.close_page(1).await.unwrap();
    assert_eq!(backend.query_open_count().await, 1);

    backend.close_context().await.unwrap();
    assert_eq!(backend.query_open_count().await, 0);
}

#[tokio::test]
async fn timeout_is_a_page_level_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let settings = BackendSettings {
        request_timeout: Duration::from_millis(50),
        ..BackendSettings::default()
    };
    let backend = HttpBackend::new(settings).unwrap();
    backend.open_context().await.unwrap();
    backend
        .open_page(8, &format!("{}/slow", server.uri()))
        .await
        .unwrap();

    let err = backend.observe_headers(8).await.unwrap_err();
    assert_eq!(err, BackendError::Timeout);
    assert!(!err.is_surface_failure());
}
