//! Configuration File Example
//!
//! Builds the middleware from a YAML file instead of code and wraps a plain
//! Tower service, without any web framework routing.
//!
//! Run:
//!   cargo run -p prerender-demos --example configured -- demos/prerender.yaml
//!
//! Try it:
//!   curl -v -A 'Mozilla/5.0 (compatible; bingbot/2.0)' http://localhost:8080/about

use std::convert::Infallible;

use axum::body::Body;
use http::{Request, Response, header};
use prerender_configuration::Settings;
use prerender_tower::Prerender;
use tower::{ServiceBuilder, service_fn};

async fn app_shell(_req: Request<Body>) -> Result<Response<Body>, Infallible> {
    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(r#"<!doctype html><div id="app"></div>"#))
        .unwrap())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info,prerender=debug")
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/prerender.yaml".to_owned());
    let config = Settings::from_path(&path)
        .and_then(Settings::into_config)
        .expect("Invalid configuration file");
    tracing::info!(?config, "Loaded configuration from {path}");

    let service = ServiceBuilder::new()
        .layer(Prerender::new(config))
        .service(service_fn(app_shell));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("Failed to bind to port 8080");
    tracing::info!("Listening on http://{}", listener.local_addr().unwrap());
    let app = axum::Router::new().fallback_service(service);
    axum::serve(listener, app).await.expect("Server error");
}
