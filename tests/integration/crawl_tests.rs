//! Integration tests for the crawler
//!
//! These tests use wiremock to serve directory listings and run complete
//! find jobs against them over HTTP.

use std::time::Duration;
use url::Url;
use wfind::config::{BackoffOptions, ConcurrencyMode, EntryType, RetryConfig};
use wfind::crawler::{FetchError, Fetcher, HttpFetcher};
use wfind::{find, FindOptions, PolicyBuilder, WfindError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renders a listing the way Go's and nginx's file servers do
fn listing(hrefs: &[&str]) -> String {
    let mut html = String::from("<html><head><title>Index</title></head><body>\n<pre>\n");
    html.push_str("<a href=\"../\">../</a>\n");
    for href in hrefs {
        html.push_str(&format!("<a href=\"{}\">{}</a>\n", href, href));
    }
    html.push_str("</pre>\n</body></html>\n");
    html
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_listing(server: &MockServer, at: &str, hrefs: &[&str]) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html(listing(hrefs)))
        .mount(server)
        .await;
}

/// Serves home/{hello, world, foo/, bar/, baz/}, each subdirectory holding
/// `Dir/` and `File`. `prefix` is put in front of every href.
async fn serve_tree(prefix: &str) -> MockServer {
    let server = MockServer::start().await;

    let home: Vec<String> = ["hello", "world", "foo/", "bar/", "baz/"]
        .iter()
        .map(|entry| format!("{}{}", prefix, entry))
        .collect();
    let home: Vec<&str> = home.iter().map(String::as_str).collect();
    mount_listing(&server, "/home/", &home).await;

    let dir = format!("{}Dir/", prefix);
    let file = format!("{}File", prefix);
    for sub in ["foo", "bar", "baz"] {
        mount_listing(&server, &format!("/home/{}/", sub), &[dir.as_str(), file.as_str()]).await;
        mount_listing(&server, &format!("/home/{}/Dir/", sub), &[]).await;
    }

    server
}

fn options(server: &MockServer, pattern: &str, entry_type: EntryType) -> FindOptions {
    FindOptions {
        seeds: vec![format!("{}/home", server.uri())],
        name_pattern: pattern.to_string(),
        entry_type: Some(entry_type.to_string()),
        ..FindOptions::default()
    }
}

fn sorted(urls: &[Url]) -> Vec<String> {
    let mut urls: Vec<String> = urls.iter().map(Url::to_string).collect();
    urls.sort();
    urls
}

fn expected(server: &MockServer, paths: &[&str]) -> Vec<String> {
    let mut urls: Vec<String> = paths
        .iter()
        .map(|p| format!("{}/home/{}", server.uri(), p))
        .collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_find_files_recursively() {
    let server = serve_tree("").await;

    let found = find(options(&server, "^File$", EntryType::File))
        .await
        .expect("find failed");

    assert_eq!(found.len(), 3);
    assert_eq!(found.base_names, vec!["File"; 3]);
    assert_eq!(
        sorted(&found.urls),
        expected(&server, &["bar/File", "baz/File", "foo/File"])
    );
}

#[tokio::test]
async fn test_find_directories_recursively() {
    let server = serve_tree("").await;

    let found = find(options(&server, "^Dir$", EntryType::Directory))
        .await
        .expect("find failed");

    assert_eq!(found.base_names, vec!["Dir"; 3]);
    assert_eq!(
        sorted(&found.urls),
        expected(&server, &["bar/Dir/", "baz/Dir/", "foo/Dir/"])
    );
}

#[tokio::test]
async fn test_find_single_file_at_seed() {
    let server = serve_tree("").await;

    let found = find(options(&server, "^hello$", EntryType::File))
        .await
        .expect("find failed");

    assert_eq!(found.base_names, vec!["hello"]);
    assert_eq!(sorted(&found.urls), expected(&server, &["hello"]));
}

#[tokio::test]
async fn test_dot_slash_listings() {
    let server = serve_tree("./").await;

    let files = find(options(&server, "^File$", EntryType::File))
        .await
        .expect("find failed");
    assert_eq!(
        sorted(&files.urls),
        expected(&server, &["bar/File", "baz/File", "foo/File"])
    );

    let dirs = find(options(&server, "^Dir$", EntryType::Directory))
        .await
        .expect("find failed");
    assert_eq!(
        sorted(&dirs.urls),
        expected(&server, &["bar/Dir/", "baz/Dir/", "foo/Dir/"])
    );
}

#[tokio::test]
async fn test_sequential_find_is_depth_first() {
    let server = serve_tree("").await;

    let mut opts = options(&server, ".+", EntryType::File);
    opts.concurrency = ConcurrencyMode::Sequential;
    let found = find(opts).await.expect("find failed");

    assert_eq!(
        found.base_names,
        vec!["hello", "world", "File", "File", "File"]
    );
    let urls: Vec<String> = found.urls.iter().map(Url::to_string).collect();
    assert_eq!(urls[2], format!("{}/home/foo/File", server.uri()));
    assert_eq!(urls[4], format!("{}/home/baz/File", server.uri()));
}

#[tokio::test]
async fn test_non_recursive_find() {
    let server = serve_tree("").await;

    let mut opts = options(&server, "^File$", EntryType::File);
    opts.recursive = false;
    let found = find(opts).await.expect("find failed");
    assert!(found.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/home/");
}

#[tokio::test]
async fn test_missing_seed_fails() {
    let server = MockServer::start().await;

    let result = find(options(&server, ".+", EntryType::File)).await;
    match result {
        Err(WfindError::Crawl { url, source }) => {
            assert_eq!(url, format!("{}/home/", server.uri()));
            assert!(source.to_string().contains("404"));
        }
        other => panic!("expected a crawl error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failing_subdirectory_does_not_stop_the_crawl() {
    let server = MockServer::start().await;
    mount_listing(&server, "/home/", &["foo/", "bar/"]).await;
    mount_listing(&server, "/home/foo/", &["File"]).await;
    Mock::given(method("GET"))
        .and(path("/home/bar/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let found = find(options(&server, "^File$", EntryType::File))
        .await
        .expect("find failed");

    assert_eq!(sorted(&found.urls), expected(&server, &["foo/File"]));
}

#[tokio::test]
async fn test_links_to_other_hosts_are_not_followed() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "/home/",
        &["http://mirror.invalid/home/", "hello"],
    )
    .await;

    let found = find(options(&server, "^hello$", EntryType::File))
        .await
        .expect("find failed");

    assert_eq!(sorted(&found.urls), expected(&server, &["hello"]));
}

#[tokio::test]
async fn test_body_is_truncated_at_limit() {
    let server = MockServer::start().await;
    let body = format!(
        "<html><body><pre><a href=\"first\">first</a>\n<!-- {} -->\n<a href=\"last\">last</a></pre></body></html>",
        "x".repeat(4096)
    );
    Mock::given(method("GET"))
        .and(path("/home/"))
        .respond_with(html(body))
        .mount(&server)
        .await;

    let mut opts = options(&server, ".+", EntryType::File);
    opts.max_body_size = 1024;
    let found = find(opts).await.expect("find failed");

    assert_eq!(found.base_names, vec!["first"]);
}

#[tokio::test]
async fn test_timed_out_request_is_retried() {
    let server = MockServer::start().await;
    mount_listing(&server, "/home/", &["foo/"]).await;

    Mock::given(method("GET"))
        .and(path("/home/foo/"))
        .respond_with(html(listing(&["File"])).set_delay(Duration::from_secs(2)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_listing(&server, "/home/foo/", &["File"]).await;

    let mut opts = options(&server, "^File$", EntryType::File);
    opts.transport.request_timeout_ms = Some(300);
    opts.retry = RetryConfig::all(BackoffOptions {
        initial_interval_ms: 10,
        max_interval_ms: 50,
        max_elapsed_time_ms: 5_000,
    });

    let found = find(opts).await.expect("find failed");
    assert_eq!(sorted(&found.urls), expected(&server, &["foo/File"]));
}

#[tokio::test]
async fn test_timed_out_request_without_retry_is_dropped() {
    let server = MockServer::start().await;
    mount_listing(&server, "/home/", &["foo/", "hello"]).await;
    Mock::given(method("GET"))
        .and(path("/home/foo/"))
        .respond_with(html(listing(&["File"])).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut opts = options(&server, ".+", EntryType::File);
    opts.transport.request_timeout_ms = Some(300);

    let found = find(opts).await.expect("find failed");
    assert_eq!(found.base_names, vec!["hello"]);
}

#[tokio::test]
async fn test_crawl_timeout_returns_what_was_found() {
    let server = MockServer::start().await;
    mount_listing(&server, "/home/", &["hello", "slow/"]).await;
    Mock::given(method("GET"))
        .and(path("/home/slow/"))
        .respond_with(html(listing(&["File"])).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let mut opts = options(&server, ".+", EntryType::File);
    opts.crawl_timeout_ms = Some(500);

    let found = find(opts).await.expect("find failed");
    assert_eq!(found.base_names, vec!["hello"]);
}

#[tokio::test]
async fn test_http_fetcher_reports_final_url_after_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/home/"),
        )
        .mount(&server)
        .await;
    mount_listing(&server, "/home/", &["hello"]).await;

    let policy = PolicyBuilder::new()
        .seed(format!("{}/home/", server.uri()))
        .build()
        .unwrap();
    let fetcher = HttpFetcher::new(&policy).unwrap();

    let page = fetcher
        .fetch(&Url::parse(&format!("{}/home", server.uri())).unwrap())
        .await
        .unwrap();
    assert_eq!(page.url.path(), "/home/");
    assert!(!page.truncated);
    assert!(page.body.contains("hello"));
}

#[tokio::test]
async fn test_redirect_to_other_host_is_not_followed() {
    let server = MockServer::start().await;
    let mirror = MockServer::start().await;
    mount_listing(&mirror, "/home/", &["hello"]).await;

    // Same machine, but "localhost" is not the seed's host
    let foreign = format!("http://localhost:{}/home/", mirror.address().port());
    Mock::given(method("GET"))
        .and(path("/home/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", foreign.as_str()))
        .mount(&server)
        .await;

    let policy = PolicyBuilder::new()
        .seed(format!("{}/home/", server.uri()))
        .build()
        .unwrap();
    let fetcher = HttpFetcher::new(&policy).unwrap();

    let err = fetcher
        .fetch(&Url::parse(&format!("{}/home/", server.uri())).unwrap())
        .await
        .unwrap_err();
    match err {
        FetchError::Status { status, .. } => assert!(status.is_redirection()),
        other => panic!("expected a redirect status, got {:?}", other),
    }

    let result = find(options(&server, ".+", EntryType::File)).await;
    assert!(matches!(result, Err(WfindError::Crawl { .. })));

    assert!(mirror.received_requests().await.unwrap().is_empty());
}
