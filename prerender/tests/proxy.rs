//! Integration tests for RenderProxy using wiremock as the rendering service.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use http::{Request, StatusCode, header, request::Parts};
use http_body_util::BodyExt;
use prerender::{Backend, BackendError, BackendResult, CACHE_STATUS_HEADER, Config, RenderProxy};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default, Clone)]
struct CountingBackend {
    storage: Arc<DashMap<String, (Bytes, Duration)>>,
    writes: Arc<AtomicUsize>,
}

impl CountingBackend {
    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for CountingBackend {
    async fn read(&self, key: &str) -> BackendResult<Option<Bytes>> {
        Ok(self.storage.get(key).map(|entry| entry.0.clone()))
    }

    async fn write(&self, key: &str, value: Bytes, ttl: Duration) -> BackendResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.storage.insert(key.to_owned(), (value, ttl));
        Ok(())
    }
}

#[derive(Debug)]
struct Unavailable;

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("store unavailable")
    }
}

impl std::error::Error for Unavailable {}

struct FailingBackend;

#[async_trait]
impl Backend for FailingBackend {
    async fn read(&self, _key: &str) -> BackendResult<Option<Bytes>> {
        Err(BackendError::ConnectionError(Box::new(Unavailable)))
    }

    async fn write(&self, _key: &str, _value: Bytes, _ttl: Duration) -> BackendResult<()> {
        Err(BackendError::ConnectionError(Box::new(Unavailable)))
    }
}

struct SlowBackend(Duration);

#[async_trait]
impl Backend for SlowBackend {
    async fn read(&self, _key: &str) -> BackendResult<Option<Bytes>> {
        tokio::time::sleep(self.0).await;
        Ok(None)
    }

    async fn write(&self, _key: &str, _value: Bytes, _ttl: Duration) -> BackendResult<()> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}

fn request(uri: &str) -> Parts {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "example.com")
        .header(
            header::USER_AGENT,
            "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
        )
        .body(())
        .unwrap()
        .into_parts()
        .0
}

async fn body_string(response: http::Response<http_body_util::Full<Bytes>>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_miss_then_hit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .and(query_param("url", "http://example.com/page?headless=&x=1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>ok</html>")
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = CountingBackend::default();
    let config = Config::builder(mock_server.uri())
        .override_param("")
        .backend(backend.clone())
        .ttl(Duration::from_secs(60))
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    let first = proxy.serve(&request("/page?x=1")).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()[CACHE_STATUS_HEADER], "MISS");
    assert_eq!(first.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(body_string(first).await, "<html>ok</html>");
    assert_eq!(backend.writes(), 1);

    let stored = backend.storage.get("http://example.com/page?x=1").unwrap();
    assert_eq!(stored.1, Duration::from_secs(60));
    drop(stored);

    let second = proxy.serve(&request("/page?x=1")).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers()[CACHE_STATUS_HEADER], "HIT");
    assert_eq!(second.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(body_string(second).await, "<html>ok</html>");
    assert_eq!(backend.writes(), 1);
}

#[tokio::test]
async fn test_override_param_not_forwarded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .and(query_param("url", "http://example.com/?a=1&headless="))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>forced</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::builder(mock_server.uri()).build().unwrap();
    let proxy = RenderProxy::new(config);

    let response = proxy.serve(&request("/?ssr&a=1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<html>forced</html>");
}

#[tokio::test]
async fn test_non_success_status_is_relayed_and_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>missing</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = CountingBackend::default();
    let config = Config::builder(mock_server.uri())
        .backend(backend.clone())
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    let first = proxy.serve(&request("/gone")).await;
    assert_eq!(first.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(first).await, "<html>missing</html>");

    let second = proxy.serve(&request("/gone")).await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    assert_eq!(second.headers()[CACHE_STATUS_HEADER], "HIT");
    assert_eq!(body_string(second).await, "<html>missing</html>");
}

#[tokio::test]
async fn test_render_timeout_returns_500_without_caching() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>late</html>")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let backend = CountingBackend::default();
    let config = Config::builder(mock_server.uri())
        .backend(backend.clone())
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    let started = Instant::now();
    let response = proxy.serve(&request("/slow")).await;
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.contains("timed out"));
    assert_eq!(backend.writes(), 0);
}

/// Rendering service announcing a longer body than it sends.
async fn truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\nhello")
                .await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{address}")
}

#[tokio::test]
async fn test_truncated_render_body_returns_500_without_caching() {
    let backend = CountingBackend::default();
    let config = Config::builder(truncating_server().await)
        .backend(backend.clone())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    let response = proxy.serve(&request("/page")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.starts_with("failed to read rendered page"), "{body}");
    assert!(body.ends_with('\n'));
    assert_eq!(backend.writes(), 0);
    assert!(backend.storage.is_empty());
}

#[tokio::test]
async fn test_unreachable_renderer_returns_500() {
    let backend = CountingBackend::default();
    let config = Config::builder("http://127.0.0.1:1")
        .backend(backend.clone())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    let response = proxy.serve(&request("/page")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert!(body_string(response).await.ends_with('\n'));
    assert_eq!(backend.writes(), 0);
}

#[tokio::test]
async fn test_failing_cache_still_renders() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = Config::builder(mock_server.uri())
        .backend(FailingBackend)
        .verbose(true)
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    for _ in 0..2 {
        let response = proxy.serve(&request("/page")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_STATUS_HEADER], "MISS");
        assert_eq!(body_string(response).await, "<html>ok</html>");
    }
}

#[tokio::test]
async fn test_slow_cache_is_bounded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::builder(mock_server.uri())
        .backend(SlowBackend(Duration::from_secs(10)))
        .cache_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    let started = Instant::now();
    let response = proxy.serve(&request("/page")).await;
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<html>ok</html>");
}

#[tokio::test]
async fn test_unreadable_entry_is_a_miss() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>fresh</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = CountingBackend::default();
    backend.storage.insert(
        "http://example.com/page".to_owned(),
        (Bytes::from_static(b"<html>stale raw body</html>"), Duration::from_secs(1)),
    );
    let config = Config::builder(mock_server.uri())
        .backend(backend.clone())
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    let response = proxy.serve(&request("/page")).await;
    assert_eq!(response.headers()[CACHE_STATUS_HEADER], "MISS");
    assert_eq!(body_string(response).await, "<html>fresh</html>");
    assert_eq!(backend.writes(), 1);
}

#[tokio::test]
async fn test_public_origin_keys_cache() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .and(query_param("url", "https://www.example.com/page?headless="))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = CountingBackend::default();
    let config = Config::builder(mock_server.uri())
        .backend(backend.clone())
        .public_origin("https://www.example.com")
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    let response = proxy.serve(&request("/page")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(backend.storage.contains_key("https://www.example.com/page"));
}

fn client_request(uri: &str, headers: &[(&str, &str)]) -> Parts {
    let mut builder = Request::builder()
        .uri(uri)
        .header(header::USER_AGENT, "curl/8");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(()).unwrap().into_parts().0
}

#[tokio::test]
async fn test_forged_forwarded_host_is_not_rendered() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .and(query_param("url", "http://169.254.169.254/latest/meta-data?headless="))
        .respond_with(ResponseTemplate::new(200).set_body_string("SECRET"))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .and(query_param("url", "http://www.example.com/latest/meta-data?headless="))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>page</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = CountingBackend::default();
    let config = Config::builder(mock_server.uri())
        .backend(backend.clone())
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    let response = proxy
        .serve(&client_request(
            "/latest/meta-data?ssr",
            &[("host", "www.example.com"), ("x-forwarded-host", "169.254.169.254")],
        ))
        .await;
    assert_eq!(body_string(response).await, "<html>page</html>");
    assert!(backend.storage.contains_key("http://www.example.com/latest/meta-data"));
    assert!(
        !backend
            .storage
            .iter()
            .any(|entry| entry.key().contains("169.254.169.254"))
    );
}

#[tokio::test]
async fn test_trusted_forwarded_host_is_rendered() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .and(query_param("url", "https://www.example.com/page?headless="))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>page</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::builder(mock_server.uri())
        .trust_forwarded_headers(true)
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    let response = proxy
        .serve(&client_request(
            "/page?ssr",
            &[
                ("host", "10.0.0.7:8080"),
                ("x-forwarded-proto", "https"),
                ("x-forwarded-host", "www.example.com"),
            ],
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<html>page</html>");
}

#[tokio::test]
async fn test_host_outside_allowlist_is_not_rendered() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .and(query_param("url", "http://169.254.169.254/latest/meta-data?headless="))
        .respond_with(ResponseTemplate::new(200).set_body_string("SECRET"))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ssr"))
        .and(query_param("url", "/latest/meta-data?headless="))
        .respond_with(ResponseTemplate::new(400).set_body_string("relative url"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = Config::builder(mock_server.uri())
        .trust_forwarded_headers(true)
        .allowed_hosts(["www.example.com"])
        .build()
        .unwrap();
    let proxy = RenderProxy::new(config);

    for headers in [
        [("host", "169.254.169.254"), ("x-forwarded-proto", "http")],
        [("host", "www.example.com"), ("x-forwarded-host", "169.254.169.254")],
    ] {
        let response = proxy
            .serve(&client_request("/latest/meta-data?ssr", &headers))
            .await;
        assert_ne!(body_string(response).await, "SECRET");
    }
}
