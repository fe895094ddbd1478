//! Tests for per-entry expiration and capacity.

use std::time::Duration;

use bytes::Bytes;
use prerender_backend::Backend;
use prerender_moka::MokaBackend;

const KEY: &str = "http://example.com/page?a=1";

#[tokio::test]
async fn read_returns_written_bytes() {
    let backend = MokaBackend::builder(100).build();
    assert!(backend.read(KEY).await.unwrap().is_none());

    backend
        .write(KEY, Bytes::from_static(b"<html>ok</html>"), Duration::from_secs(60))
        .await
        .unwrap();

    assert_eq!(
        backend.read(KEY).await.unwrap(),
        Some(Bytes::from_static(b"<html>ok</html>"))
    );
}

#[tokio::test]
async fn entry_expires_after_ttl() {
    let backend = MokaBackend::builder(100).build();
    backend
        .write(KEY, Bytes::from_static(b"short"), Duration::from_millis(50))
        .await
        .unwrap();
    assert!(backend.read(KEY).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(backend.read(KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn rewrite_uses_new_ttl() {
    let backend = MokaBackend::builder(100).build();
    backend
        .write(KEY, Bytes::from_static(b"v1"), Duration::from_millis(50))
        .await
        .unwrap();
    backend
        .write(KEY, Bytes::from_static(b"v2"), Duration::from_secs(60))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        backend.read(KEY).await.unwrap(),
        Some(Bytes::from_static(b"v2"))
    );
}

#[tokio::test]
async fn entry_capacity_is_enforced() {
    let backend = MokaBackend::builder(2).build();
    for i in 0..10 {
        backend
            .write(&format!("key-{i}"), Bytes::from_static(b"x"), Duration::from_secs(60))
            .await
            .unwrap();
    }
    backend.cache().run_pending_tasks().await;

    assert!(backend.cache().entry_count() <= 2);
    assert_eq!(backend.name(), "moka");
}
