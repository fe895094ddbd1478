//! Prometheus Metrics Example
//!
//! Exposes the middleware counters (requests by path, cache hits and misses,
//! render errors and durations) on a Prometheus endpoint.
//!
//! Run:
//!   cargo run -p prerender-demos --example observability --features observability
//!
//! Endpoints:
//!   - http://localhost:8080/         - App shell, rendered for bots
//!   - http://localhost:8080/metrics  - Prometheus metrics
//!
//! Try it:
//!   curl -A 'Googlebot/2.1' http://localhost:8080/
//!   curl http://localhost:8080/metrics | grep prerender_

use std::time::Duration;

use axum::{Router, response::Html, routing::get};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use prerender::Config;
use prerender_moka::MokaBackend;
use prerender_tower::Prerender;

fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("prerender_render_duration_seconds".to_string()),
            &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
        )
        .expect("Failed to set histogram buckets")
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info,prerender=debug")
        .init();
    let handle = init_metrics();

    let renderer = std::env::var("RENDERER").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let config = Config::builder(renderer)
        .backend(MokaBackend::builder(10_000).build())
        .ttl(Duration::from_secs(60 * 60))
        .allowed_hosts(["localhost", "127.0.0.1"])
        .build()
        .expect("Invalid prerender configuration");

    let site = Router::new()
        .route("/", get(|| async { Html(r#"<!doctype html><div id="app"></div>"#) }))
        .layer(Prerender::new(config));
    let app = Router::new()
        .route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        )
        .merge(site);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("Failed to bind to port 8080");
    tracing::info!("Listening on http://{}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Server error");
}
