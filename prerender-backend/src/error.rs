//! Error types for cache store operations.

use thiserror::Error;

/// Error type for cache store operations.
///
/// Absence of an entry is not an error: [`Backend::read`](crate::Backend::read)
/// returns `Ok(None)` for a missing key. These variants only describe
/// genuine failures to talk to the store.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal store error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote stores (e.g., Redis).
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),
}
