//! Cache store abstraction for the prerender middleware.
//!
//! A cache store maps a request URL to the bytes of a previously rendered page.
//! Entries are written with a time-to-live and expire on their own; the
//! middleware never deletes anything explicitly.
//!
//! If you want to plug in your own store, implement [`Backend`].
mod backend;
mod error;
mod none;

pub use backend::{Backend, BackendResult};
pub use error::BackendError;
pub use none::NoCache;
