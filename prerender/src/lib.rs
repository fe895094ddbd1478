//! Serve pre-rendered pages to crawlers.
//!
//! Single page applications render in the browser, which leaves crawlers and
//! link-preview bots with an empty shell. This crate decides, per request,
//! whether the caller is such a bot and, if so, answers with a fully rendered
//! copy of the page fetched from an external rendering service. Rendered pages
//! are kept in a pluggable cache store so each URL is rendered once per TTL.
//!
//! # Core Concepts
//!
//! - **[`Config`]**: immutable settings built once with [`Config::builder`].
//! - **[`Detector`]**: decides whether a request should be rendered.
//! - **[`RenderProxy`]**: cache-aside lookup, render call and response relay.
//! - **[`Backend`]**: the cache store, see [`prerender_backend`].
//! - **[`Renderer`]**: the rendering service client, [`HttpRenderer`] by default.
//!
//! The tower middleware that wires these together lives in `prerender-tower`.
//!
//! ```no_run
//! use std::time::Duration;
//! use prerender::{Config, RenderProxy};
//!
//! let config = Config::builder("http://localhost:3000")
//!     .user_agents(["Googlebot", "bingbot"])
//!     .ttl(Duration::from_secs(24 * 60 * 60))
//!     .build()
//!     .unwrap();
//! let proxy = RenderProxy::new(config);
//! ```
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// User agent classification.
pub mod classifier;
/// Middleware configuration and its builder.
pub mod config;
/// Request routing decisions.
pub mod detector;
/// Counters and histograms, active with the `metrics` feature.
pub mod metrics;
/// Cached page envelope.
pub mod page;
/// The cache-aside render pipeline.
pub mod proxy;
/// Rendering service client.
pub mod renderer;
/// Request URL reconstruction and query rewriting.
pub mod request;

pub use classifier::{CrawlerClassifier, UserAgentClassifier};
pub use config::{Config, ConfigBuilder, ConfigError, DEFAULT_USER_AGENTS};
pub use detector::Detector;
pub use page::{CACHE_STATUS_HEADER, CacheStatus, CachedPage};
pub use prerender_backend::{Backend, BackendError, BackendResult, NoCache};
pub use proxy::RenderProxy;
pub use renderer::{HttpRenderer, RenderError, Renderer};
pub use request::OriginPolicy;

#[cfg(feature = "uap")]
pub use classifier::UapClassifier;
