//! Moka backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use prerender_backend::{Backend, BackendResult};
use tracing::trace;

use crate::builder::MokaBackendBuilder;

/// A stored page together with the TTL it was written with.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Stored bytes.
    pub data: Bytes,
    /// Time to live, counted from the moment of insertion.
    pub ttl: Duration,
}

/// In-memory cache store powered by Moka.
///
/// `MokaBackend` provides a concurrent in-memory cache with per-entry
/// expiration. Every entry lives for the TTL passed to
/// [`write`](Backend::write); rewriting a key restarts its clock.
///
/// # Caveats
///
/// - Data is **not persisted**: the cache is lost on process restart
/// - Data is **not shared** across processes. Use Redis for distributed caching
#[derive(Clone)]
pub struct MokaBackend {
    pub(crate) cache: Cache<String, Entry>,
    pub(crate) name: String,
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("name", &self.name)
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl MokaBackend {
    /// Creates a new builder for `MokaBackend` with the specified maximum capacity.
    ///
    /// The capacity is the number of entries by default, or approximate bytes
    /// when [`MokaBackendBuilder::weigh_by_size`] is used.
    pub fn builder(max_capacity: u64) -> MokaBackendBuilder {
        MokaBackendBuilder::new(max_capacity)
    }

    /// Returns the underlying Moka cache.
    pub fn cache(&self) -> &Cache<String, Entry> {
        &self.cache
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn read(&self, key: &str) -> BackendResult<Option<Bytes>> {
        let entry = self.cache.get(key).await;
        trace!(key, hit = entry.is_some(), "moka read");
        Ok(entry.map(|entry| entry.data))
    }

    async fn write(&self, key: &str, value: Bytes, ttl: Duration) -> BackendResult<()> {
        trace!(key, ?ttl, bytes = value.len(), "moka write");
        self.cache
            .insert(key.to_owned(), Entry { data: value, ttl })
            .await;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
