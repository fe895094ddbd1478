use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;

use crate::BackendError;

pub type BackendResult<T> = Result<T, BackendError>;

/// Key-value store with per-entry expiration.
///
/// Implementations must be safe to share between concurrently running
/// requests; the middleware holds a single instance behind an `Arc`.
#[async_trait]
pub trait Backend: Sync + Send {
    /// Returns the stored bytes for `key`, or `None` if there is no live entry.
    async fn read(&self, key: &str) -> BackendResult<Option<Bytes>>;

    /// Stores `value` under `key`. The entry expires after `ttl`.
    async fn write(&self, key: &str, value: Bytes, ttl: Duration) -> BackendResult<()>;

    /// Returns the name of this backend, used in log records.
    fn name(&self) -> &str {
        "backend"
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn read(&self, key: &str) -> BackendResult<Option<Bytes>> {
        (*self).read(key).await
    }

    async fn write(&self, key: &str, value: Bytes, ttl: Duration) -> BackendResult<()> {
        (*self).write(key, value, ttl).await
    }

    fn name(&self) -> &str {
        (*self).name()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &str) -> BackendResult<Option<Bytes>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: Bytes, ttl: Duration) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn read(&self, key: &str) -> BackendResult<Option<Bytes>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: Bytes, ttl: Duration) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
