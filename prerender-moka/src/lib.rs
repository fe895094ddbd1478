//! In-memory cache store for prerender, powered by [Moka](https://docs.rs/moka).
//!
//! ```
//! use prerender_moka::MokaBackend;
//!
//! let backend = MokaBackend::builder(10_000).build();
//! ```
#![warn(missing_docs)]

mod backend;
mod builder;

pub use backend::{Entry, MokaBackend};
pub use builder::MokaBackendBuilder;
pub use moka::policy::EvictionPolicy;
