//! Error types for Redis backend operations.
//!
//! All errors can be converted to [`BackendError`] for uniform error handling
//! across cache stores.
//!
//! [`BackendError`]: prerender_backend::BackendError

use prerender_backend::BackendError;
use redis::RedisError;

/// Error type for Redis backend operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    ///
    /// This includes connection failures, protocol errors, authentication
    /// failures, and command execution errors.
    #[error("Redis backend error: {0}")]
    Redis(#[from] RedisError),
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        let Error::Redis(inner) = &error;
        if inner.is_io_error() {
            Self::ConnectionError(Box::new(error))
        } else {
            Self::InternalError(Box::new(error))
        }
    }
}
