//! Tower middleware serving pre-rendered pages to crawlers.
//!
//! This crate provides [`Prerender`], a Tower [`Layer`] that sits in front of
//! any HTTP service. Every request is checked by the configured
//! [`Detector`](prerender::Detector):
//!
//! - **Bots** (and requests carrying the override parameter) are answered by
//!   the [`RenderProxy`]: the page is looked up in the cache store, rendered by
//!   the rendering service on a miss, and the wrapped service is never called.
//! - **Everyone else**, including the rendering service itself fetching the
//!   page with the headless marker, goes straight to the wrapped service.
//!
//! [`Layer`]: tower::Layer
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use prerender::Config;
//! use prerender_tower::Prerender;
//! use tower::{ServiceBuilder, service_fn};
//!
//! let config = Config::builder("http://localhost:3000")
//!     .ttl(Duration::from_secs(24 * 60 * 60))
//!     .build()
//!     .unwrap();
//!
//! let service = ServiceBuilder::new()
//!     .layer(Prerender::new(config))
//!     .service(service_fn(|_req: http::Request<()>| async {
//!         Ok::<_, std::convert::Infallible>(http::Response::new(
//!             http_body_util::Full::new(bytes::Bytes::from_static(b"<div id=app></div>")),
//!         ))
//!     }));
//! ```
//!
//! # Response Headers
//!
//! Rendered responses carry [`CACHE_STATUS_HEADER`](prerender::CACHE_STATUS_HEADER):
//!
//! | Header Value | Meaning |
//! |--------------|---------|
//! | `HIT` | Rendered page served from the cache store |
//! | `MISS` | Page rendered for this request |
//!
//! Passthrough responses are left untouched.

#![warn(missing_docs)]

/// Future types for the middleware service.
pub mod future;
/// Tower layer.
pub mod layer;
/// The Tower service routing requests.
pub mod service;

pub use layer::Prerender;
pub use prerender::{Config, ConfigBuilder, RenderProxy};
pub use service::PrerenderService;
