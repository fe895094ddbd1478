//! Metrics declaration and recording.
//!
//! With the `metrics` feature enabled the functions below report through the
//! [`metrics`](https://docs.rs/metrics) facade; otherwise they compile to
//! nothing.
//!
//! ## Naming Pattern
//!
//! - `prerender_requests_total{path}` - routing decisions (`render` or `passthrough`)
//! - `prerender_cache_{hit,miss}_total` - cache lookups on the render path
//! - `prerender_render_*` - calls to the rendering service
//! - `prerender_cache_write_errors_total` - failed or timed out cache writes

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track routing decisions.
    pub static ref REQUESTS_TOTAL: &'static str = {
        metrics::describe_counter!(
            "prerender_requests_total",
            "Total number of requests seen by the middleware, by path."
        );
        "prerender_requests_total"
    };
    /// Track number of cache hits on the render path.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "prerender_cache_hit_total",
            "Total number of rendered pages served from cache."
        );
        "prerender_cache_hit_total"
    };
    /// Track number of cache misses on the render path.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "prerender_cache_miss_total",
            "Total number of render path requests not found in cache."
        );
        "prerender_cache_miss_total"
    };
    /// Track failed render calls.
    pub static ref RENDER_ERRORS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "prerender_render_errors_total",
            "Total number of failed or timed out render calls."
        );
        "prerender_render_errors_total"
    };
    /// Histogram of successful render call duration.
    pub static ref RENDER_DURATION: &'static str = {
        metrics::describe_histogram!(
            "prerender_render_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of successful render calls in seconds."
        );
        "prerender_render_duration_seconds"
    };
    /// Track failed cache writes.
    pub static ref CACHE_WRITE_ERRORS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "prerender_cache_write_errors_total",
            "Total number of cache writes that failed or timed out."
        );
        "prerender_cache_write_errors_total"
    };
}

/// Which way the middleware routed a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Answered by the render proxy.
    Render,
    /// Handed to the wrapped service.
    Passthrough,
}

impl Route {
    /// Label value for this route.
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Render => "render",
            Route::Passthrough => "passthrough",
        }
    }
}

/// Record a routing decision.
#[inline]
pub fn record_request(route: Route) {
    #[cfg(feature = "metrics")]
    metrics::counter!(*REQUESTS_TOTAL, "path" => route.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = route;
}

/// Record a cache hit.
#[inline]
pub fn record_hit() {
    #[cfg(feature = "metrics")]
    metrics::counter!(*CACHE_HIT_COUNTER).increment(1);
}

/// Record a cache miss.
#[inline]
pub fn record_miss() {
    #[cfg(feature = "metrics")]
    metrics::counter!(*CACHE_MISS_COUNTER).increment(1);
}

/// Record a failed render call.
#[inline]
pub fn record_render_error() {
    #[cfg(feature = "metrics")]
    metrics::counter!(*RENDER_ERRORS_COUNTER).increment(1);
}

/// Record the duration of a successful render call.
#[inline]
pub fn record_render_duration(duration: Duration) {
    #[cfg(feature = "metrics")]
    metrics::histogram!(*RENDER_DURATION).record(duration.as_secs_f64());
    #[cfg(not(feature = "metrics"))]
    let _ = duration;
}

/// Record a failed cache write.
#[inline]
pub fn record_cache_write_error() {
    #[cfg(feature = "metrics")]
    metrics::counter!(*CACHE_WRITE_ERRORS_COUNTER).increment(1);
}
