//! Builder for configuring [`MokaBackend`].

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::backend::{Entry, MokaBackend};

/// Expiration policy that reads the TTL stored in each [`Entry`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Expiration;

impl Expiry<String, Entry> for Expiration {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // Moka keeps the old deadline by default; a rewrite must use the new TTL.
        Some(value.ttl)
    }
}

/// Builder for creating and configuring a [`MokaBackend`].
///
/// ```
/// use prerender_moka::{EvictionPolicy, MokaBackend};
///
/// let backend = MokaBackend::builder(64 * 1024 * 1024)
///     .weigh_by_size()
///     .eviction_policy(EvictionPolicy::lru())
///     .name("pages")
///     .build();
/// ```
pub struct MokaBackendBuilder {
    max_capacity: u64,
    weigh_by_size: bool,
    name: String,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaBackendBuilder {
    /// Creates a builder with the given capacity.
    pub fn new(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            weigh_by_size: false,
            name: "moka".to_owned(),
            eviction_policy: None,
        }
    }

    /// Treat the capacity as an approximate byte budget instead of an entry count.
    pub fn weigh_by_size(mut self) -> Self {
        self.weigh_by_size = true;
        self
    }

    /// Set a custom name used in log records.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the eviction policy (TinyLFU by default).
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Builds the backend.
    pub fn build(self) -> MokaBackend {
        let mut builder = Cache::builder()
            .max_capacity(self.max_capacity)
            .expire_after(Expiration);
        if self.weigh_by_size {
            builder = builder.weigher(|key: &String, entry: &Entry| -> u32 {
                (key.len() + entry.data.len()).try_into().unwrap_or(u32::MAX)
            });
        }
        if let Some(policy) = self.eviction_policy {
            builder = builder.eviction_policy(policy);
        }
        MokaBackend {
            cache: builder.build(),
            name: self.name,
        }
    }
}
