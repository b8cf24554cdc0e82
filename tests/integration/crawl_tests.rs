//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! check-and-crawl cycle end-to-end over real HTTP. Request counts are
//! verified by wiremock when each server is dropped.

use siteqa::config::CrawlConfig;
use siteqa::crawler::{crawl, HttpTransport, RedirectRecord, Transport};
use siteqa::{run_crawl, FetchError, SiteqaError};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

fn html_head() -> ResponseTemplate {
    ResponseTemplate::new(200).insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts an HTML page that must be checked once and fetched `gets` times
async fn mount_page(server: &MockServer, page: &str, body: &str, gets: u64) {
    Mock::given(method("HEAD"))
        .and(path(page))
        .respond_with(html_head())
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html_page(body))
        .expect(gets)
        .mount(server)
        .await;
}

/// Mounts a HEAD-only response that must be requested exactly once
async fn mount_head(server: &MockServer, page: &str, response: ResponseTemplate) {
    Mock::given(method("HEAD"))
        .and(path(page))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn root(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

#[tokio::test]
async fn test_single_page_without_links() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><body><p>Nothing to see</p></body></html>", 1).await;

    let report = run_crawl(&server.uri(), 4, 10).await.unwrap();

    assert!(report.has_no_anomalies());
    assert_eq!(report.start_url, root(&server));
    assert_eq!(report.stats.links_checked, 1);
    assert_eq!(report.stats.pages_crawled, 1);
}

async fn crawl_fan_out(workers: usize) {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/a">A</a> <a href="/a#section">A again</a> <a href="b">B</a>"#,
        1,
    )
    .await;
    mount_page(
        &server,
        "/a",
        r#"<a href="/a/one">One</a> <a href="/a/two">Two</a> <a href="/b">B</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/b", r#"<a href="/b/one">One</a> <a href="/">Home</a>"#, 1).await;
    mount_page(&server, "/a/one", "<p>leaf</p>", 1).await;
    mount_page(&server, "/a/two", "<p>leaf</p>", 1).await;
    mount_page(&server, "/b/one", "<p>leaf</p>", 1).await;

    let report = run_crawl(&server.uri(), workers, 10).await.unwrap();

    assert!(report.has_no_anomalies());
    assert_eq!(report.stats.links_checked, 6);
    assert_eq!(report.stats.pages_crawled, 6);
}

#[tokio::test]
async fn test_fan_out_single_worker() {
    crawl_fan_out(1).await;
}

#[tokio::test]
async fn test_fan_out_many_workers() {
    crawl_fan_out(8).await;
}

#[tokio::test]
async fn test_broken_and_redirected_links() {
    let server = MockServer::start().await;
    let root = root(&server);

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">Missing</a>
           <a href="/error">Error</a>
           <a href="/old">Old</a>"#,
        1,
    )
    .await;
    mount_head(&server, "/error", ResponseTemplate::new(500)).await;

    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/new", "<p>moved here</p>", 1).await;

    let report = run_crawl(&server.uri(), 4, 10).await.unwrap();

    assert_eq!(report.client_errors[&root], vec![format!("{}missing", root)]);
    assert_eq!(report.server_errors[&root], vec![format!("{}error", root)]);
    assert_eq!(
        report.redirects[&root],
        vec![RedirectRecord {
            target: format!("{}old", root),
            final_url: format!("{}new", root),
        }]
    );
    assert!(report.unreachable.is_empty());
    assert_eq!(report.broken_count(), 2);
}

#[tokio::test]
async fn test_broken_link_reported_under_linking_page() {
    let server = MockServer::start().await;
    let root = root(&server);

    mount_page(&server, "/", r#"<a href="/docs/">Docs</a>"#, 1).await;
    mount_page(&server, "/docs/", r#"<a href="gone.html">Gone</a>"#, 1).await;

    let report = run_crawl(&server.uri(), 2, 10).await.unwrap();

    let docs = format!("{}docs/", root);
    assert_eq!(report.client_errors[&docs], vec![format!("{}docs/gone.html", root)]);
    assert!(!report.client_errors.contains_key(&root));
}

#[tokio::test]
async fn test_off_site_links_are_checked_not_crawled() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(r#"<a href="{}/external">Elsewhere</a>"#, other.uri()),
        1,
    )
    .await;
    mount_page(&other, "/external", r#"<a href="/deeper">Deeper</a>"#, 0).await;

    let report = run_crawl(&server.uri(), 2, 10).await.unwrap();

    assert!(report.has_no_anomalies());
    assert_eq!(report.stats.links_checked, 2);
    assert_eq!(report.stats.pages_crawled, 1);
}

#[tokio::test]
async fn test_non_html_links_are_not_fetched() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/manual.pdf">Manual</a> <a href="mailto:team@example.com">Mail</a>"#,
        1,
    )
    .await;
    mount_head(
        &server,
        "/manual.pdf",
        ResponseTemplate::new(200).insert_header("content-type", "application/pdf"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_crawl(&server.uri(), 2, 10).await.unwrap();

    assert!(report.has_no_anomalies());
    assert_eq!(report.stats.links_checked, 2);
}

#[tokio::test]
async fn test_unreachable_link_does_not_stop_crawl() {
    let server = MockServer::start().await;
    let root = root(&server);

    mount_page(
        &server,
        "/",
        r#"<a href="http://127.0.0.1:1/">Refused</a> <a href="/fine">Fine</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/fine", "<p>ok</p>", 1).await;

    let report = run_crawl(&server.uri(), 2, 10).await.unwrap();

    assert_eq!(report.unreachable[&root].len(), 1);
    assert_eq!(report.unreachable[&root][0].target, "http://127.0.0.1:1/");
    assert_eq!(report.stats.transport_failures, 1);
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_slow_link_times_out() {
    let server = MockServer::start().await;
    let root = root(&server);

    mount_page(&server, "/", r#"<a href="/slow">Slow</a>"#, 1).await;
    Mock::given(method("HEAD"))
        .and(path("/slow"))
        .respond_with(html_head().set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let report = run_crawl(&server.uri(), 2, 1).await.unwrap();

    assert_eq!(report.unreachable[&root].len(), 1);
    assert_eq!(report.unreachable[&root][0].target, format!("{}slow", root));
}

#[tokio::test]
async fn test_start_url_without_scheme() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<p>hello</p>", 1).await;

    let bare = server.uri().trim_start_matches("http://").to_string();
    let report = run_crawl(&bare, 1, 10).await.unwrap();

    assert_eq!(report.start_url, root(&server));
    assert!(report.has_no_anomalies());
}

#[tokio::test]
async fn test_crawl_with_full_config() {
    let server = MockServer::start().await;
    let root = root(&server);

    mount_page(&server, "/", r#"<a href="/temp">Temp</a>"#, 1).await;
    Mock::given(method("HEAD"))
        .and(path("/temp"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/target"))
        .expect(1)
        .mount(&server)
        .await;
    mount_head(
        &server,
        "/target",
        ResponseTemplate::new(200).insert_header("content-type", "text/plain"),
    )
    .await;

    let config = CrawlConfig::new(&server.uri(), 2, 10)
        .unwrap()
        .with_temporary_redirects(true);
    let report = crawl(config).await.unwrap();

    assert!(report.redirects.is_empty());
    assert_eq!(
        report.temporary_redirects[&root],
        vec![RedirectRecord {
            target: format!("{}temp", root),
            final_url: format!("{}target", root),
        }]
    );
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected() {
    assert!(matches!(
        run_crawl("http://localhost:8000", 0, 10).await,
        Err(SiteqaError::Config(_))
    ));
    assert!(matches!(
        run_crawl("http://localhost:8000", 1, 0).await,
        Err(SiteqaError::Config(_))
    ));
    assert!(matches!(
        run_crawl("ftp://localhost/", 1, 10).await,
        Err(SiteqaError::Config(_))
    ));
    assert!(matches!(run_crawl("", 1, 10).await, Err(SiteqaError::Config(_))));
}

#[tokio::test]
async fn test_transport_records_redirect_history() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/first"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/second"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/second"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/final"))
        .mount(&server)
        .await;
    mount_head(&server, "/final", html_head()).await;

    let config = CrawlConfig::new(&server.uri(), 1, 10).unwrap();
    let transport = HttpTransport::new(&config).unwrap();
    let response = transport
        .head(&format!("{}/first", server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.final_url, format!("{}/final", server.uri()));
    let statuses: Vec<u16> = response.history.iter().map(|hop| hop.status).collect();
    assert_eq!(statuses, vec![301, 302]);
    assert_eq!(response.history[0].url, format!("{}/first", server.uri()));
}

#[tokio::test]
async fn test_transport_detects_redirect_loop() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/pong"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/pong"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/ping"))
        .mount(&server)
        .await;

    let config = CrawlConfig::new(&server.uri(), 1, 10).unwrap();
    let transport = HttpTransport::new(&config).unwrap();
    let result = transport.head(&format!("{}/ping", server.uri())).await;

    assert!(matches!(result, Err(FetchError::RedirectLoop { .. })));
}

#[tokio::test]
async fn test_transport_enforces_redirect_limit() {
    let server = MockServer::start().await;

    for hop in 0..5 {
        Mock::given(method("HEAD"))
            .and(path(format!("/hop{}", hop)))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("/hop{}", hop + 1).as_str()),
            )
            .mount(&server)
            .await;
    }

    let config = CrawlConfig::new(&server.uri(), 1, 10)
        .unwrap()
        .with_max_redirects(2);
    let transport = HttpTransport::new(&config).unwrap();
    let result = transport.head(&format!("{}/hop0", server.uri())).await;

    assert!(matches!(result, Err(FetchError::RedirectLimit { .. })));
}
