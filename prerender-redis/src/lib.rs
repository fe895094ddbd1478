//! Redis cache store for prerender.
//!
//! Rendered pages are stored under `<prefix><request url>` as the
//! bincode-encoded `CachedPage` envelope (status, headers and body) handed in
//! by the middleware. They expire through Redis' own `PX` timer, so several
//! middleware instances can share one cache.
//!
//! ```no_run
//! use prerender_redis::RedisBackend;
//!
//! let backend = RedisBackend::builder()
//!     .server("redis://127.0.0.1:6379/")
//!     .prefix("ssr:")
//!     .build()
//!     .unwrap();
//! ```
#![warn(missing_docs)]

pub mod backend;
pub mod error;

#[doc(inline)]
pub use crate::backend::{DEFAULT_PREFIX, RedisBackend, RedisBackendBuilder};
#[doc(inline)]
pub use crate::error::Error;
