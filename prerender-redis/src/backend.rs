//! Redis backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use prerender_backend::{Backend, BackendError, BackendResult};
use redis::{Client, aio::ConnectionManager};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// Key prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "ssr:";

/// Redis cache store based on the redis-rs crate.
///
/// It uses a [`ConnectionManager`] for asynchronous network interaction. The
/// connection is established lazily on the first cache operation.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    prefix: String,
    name: String,
}

impl RedisBackend {
    /// Create new backend instance with default settings.
    pub fn new() -> Result<Self, BackendError> {
        Ok(Self::builder().build()?)
    }

    /// Creates new RedisBackend builder with default settings.
    #[must_use]
    pub fn builder() -> RedisBackendBuilder {
        RedisBackendBuilder::default()
    }

    /// Create lazy connection to redis via [`ConnectionManager`]
    pub async fn connection(&self) -> Result<&ConnectionManager, BackendError> {
        trace!("Get connection manager");
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("Initialize new redis connection manager");
                self.client.get_connection_manager()
            })
            .await
            .map_err(Error::from)?;
        Ok(manager)
    }

    /// Returns the Redis key a request URL is stored under.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

/// Part of builder pattern implementation for RedisBackend.
pub struct RedisBackendBuilder {
    connection_info: String,
    prefix: String,
    name: String,
}

impl Default for RedisBackendBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
            prefix: DEFAULT_PREFIX.to_owned(),
            name: "redis".to_owned(),
        }
    }
}

impl RedisBackendBuilder {
    /// Set connection info (host, port, database, etc.) for RedisBackend.
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Set the prefix prepended to every key.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set a custom name used in log records.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Create new instance of Redis backend with passed settings.
    pub fn build(self) -> Result<RedisBackend, Error> {
        Ok(RedisBackend {
            client: Client::open(self.connection_info)?,
            connection: OnceCell::new(),
            prefix: self.prefix,
            name: self.name,
        })
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn read(&self, key: &str) -> BackendResult<Option<Bytes>> {
        let mut con = self.connection().await?.clone();
        let data: Option<Vec<u8>> = redis::cmd("GET")
            .arg(self.storage_key(key))
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(data.map(Bytes::from))
    }

    async fn write(&self, key: &str, value: Bytes, ttl: Duration) -> BackendResult<()> {
        let mut con = self.connection().await?.clone();
        // PX 0 is rejected by Redis.
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        redis::cmd("SET")
            .arg(self.storage_key(key))
            .arg(value.as_ref())
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed() {
        let backend = RedisBackend::builder().build().unwrap();
        assert_eq!(
            backend.storage_key("http://example.com/?a=1"),
            "ssr:http://example.com/?a=1"
        );

        let backend = RedisBackend::builder().prefix("").name("pages").build().unwrap();
        assert_eq!(backend.storage_key("http://example.com/"), "http://example.com/");
        assert_eq!(backend.name(), "pages");
    }

    #[test]
    fn invalid_url_is_rejected() {
        let result = RedisBackend::builder().server("not-a-valid-url").build();
        assert!(matches!(result, Err(Error::Redis(_))));
    }
}
