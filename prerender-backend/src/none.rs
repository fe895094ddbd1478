//! Store used when caching is disabled.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::trace;

use crate::{Backend, BackendResult};

/// A store that never holds anything.
///
/// Every read misses and every write reports success, so each bot request
/// goes to the render backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl Backend for NoCache {
    async fn read(&self, key: &str) -> BackendResult<Option<Bytes>> {
        trace!(key, "nocache read");
        Ok(None)
    }

    async fn write(&self, key: &str, _value: Bytes, _ttl: Duration) -> BackendResult<()> {
        trace!(key, "nocache write discarded");
        Ok(())
    }

    fn name(&self) -> &str {
        "none"
    }
}
