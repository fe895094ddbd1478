//! Cache-aside render pipeline.
//!
//! ```text
//! request ──► cache read ──hit──► stored page
//!                 │
//!               miss / error / timeout
//!                 ▼
//!          render (deadline) ──error──► 500
//!                 │
//!                 ▼
//!        cache write (best effort) ──► rendered page
//! ```
//!
//! Every cache call is bounded by [`Config::cache_timeout`], so a slow store
//! degrades to cache misses instead of stalling bot traffic.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{HeaderValue, Response, StatusCode, header, request::Parts};
use http_body_util::Full;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::detector::Detector;
use crate::metrics;
use crate::page::{CacheStatus, CachedPage};
use crate::renderer::RenderError;
use crate::request::{absolute_url, headless_url};

/// Serves rendered pages for requests the [`Detector`] routed to rendering.
///
/// Cloning is cheap and clones share the configuration.
#[derive(Debug, Clone)]
pub struct RenderProxy {
    config: Arc<Config>,
}

impl RenderProxy {
    /// Creates a proxy for the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Configuration this proxy runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shortcut for the configured [`Detector`].
    pub fn detector(&self) -> &Detector {
        self.config.detector()
    }

    /// Answers a request with its rendered page.
    ///
    /// Never fails: render errors become a `500` response carrying the error
    /// text, cache errors are treated as misses or ignored.
    pub async fn serve(&self, parts: &Parts) -> Response<Full<Bytes>> {
        let config = &*self.config;
        let key = absolute_url(parts, config.origin_policy());

        if let Some(page) = self.lookup(&key).await {
            metrics::record_hit();
            if config.verbose() {
                debug!(%key, status = %page.status(), "serving cached render");
            }
            return page.into_response(CacheStatus::Hit);
        }
        metrics::record_miss();

        let detector = config.detector();
        let target = headless_url(&key, detector.headless_param(), detector.override_param());
        if config.verbose() {
            debug!(%key, %target, "rendering page");
        }

        let started = Instant::now();
        let rendered = match timeout(config.timeout(), config.renderer().render(&target)).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout(config.timeout())),
        };
        let page = match rendered {
            Ok(page) => page,
            Err(err) => {
                metrics::record_render_error();
                if config.verbose() {
                    warn!(%key, error = %err, "render failed");
                }
                return error_response(&err);
            }
        };
        metrics::record_render_duration(started.elapsed());

        self.store(&key, &page).await;
        page.into_response(CacheStatus::Miss)
    }

    async fn lookup(&self, key: &str) -> Option<CachedPage> {
        let config = &*self.config;
        let backend = config.backend();
        let bytes = match timeout(config.cache_timeout(), backend.read(key)).await {
            Ok(Ok(Some(bytes))) => bytes,
            Ok(Ok(None)) => {
                trace!(key, backend = backend.name(), "cache miss");
                return None;
            }
            Ok(Err(err)) => {
                if config.verbose() {
                    warn!(key, backend = backend.name(), error = %err, "cache read failed");
                }
                return None;
            }
            Err(_) => {
                if config.verbose() {
                    warn!(key, backend = backend.name(), timeout = ?config.cache_timeout(), "cache read timed out");
                }
                return None;
            }
        };

        match CachedPage::decode(&bytes) {
            Ok(page) => Some(page),
            Err(err) => {
                if config.verbose() {
                    warn!(key, error = %err, "discarding unreadable cache entry");
                }
                None
            }
        }
    }

    async fn store(&self, key: &str, page: &CachedPage) {
        let config = &*self.config;
        let backend = config.backend();
        let bytes = match page.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                metrics::record_cache_write_error();
                if config.verbose() {
                    warn!(key, error = %err, "failed to encode rendered page");
                }
                return;
            }
        };

        let failure = match timeout(config.cache_timeout(), backend.write(key, bytes, config.ttl())).await {
            Ok(Ok(())) => {
                trace!(key, backend = backend.name(), ttl = ?config.ttl(), "cached render");
                return;
            }
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!("timed out after {:?}", config.cache_timeout()),
        };
        metrics::record_cache_write_error();
        if config.verbose() {
            warn!(key, backend = backend.name(), error = %failure, "cache write failed");
        }
    }
}

/// Plain text `500` carrying the error message.
fn error_response(err: &RenderError) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(format!("{err}\n"))));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}
