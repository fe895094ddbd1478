//! Axum Integration Example
//!
//! Serves a single page application shell to browsers and pre-rendered pages
//! to crawlers, with rendered pages kept in memory for a day.
//!
//! Requires a rendering service answering `GET /ssr?url=...`, for example
//! Rendertron, listening on the address in `RENDERER` (default
//! `http://localhost:3000`).
//!
//! Run:
//!   cargo run -p prerender-demos --example axum
//!
//! Try it:
//!   curl -v http://localhost:8080/                                   # App shell
//!   curl -v -A 'Googlebot/2.1' http://localhost:8080/               # Rendered, MISS
//!   curl -v -A 'Googlebot/2.1' http://localhost:8080/               # Rendered, HIT
//!   curl -v 'http://localhost:8080/?ssr'                             # Forced render

use std::time::Duration;

use axum::{Router, response::Html, routing::get};
use prerender::Config;
use prerender_moka::MokaBackend;
use prerender_tower::Prerender;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
  <head><title>Demo</title></head>
  <body>
    <div id="app"></div>
    <script>
      document.getElementById("app").innerHTML = "<h1>Rendered in the browser</h1>";
    </script>
  </body>
</html>
"#;

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[tokio::main]
async fn main() {
    let subscriber = tracing_subscriber::fmt()
        .pretty()
        .with_env_filter("debug,prerender=trace")
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let renderer = std::env::var("RENDERER").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let config = Config::builder(renderer)
        .backend(MokaBackend::builder(10_000).build())
        .ttl(Duration::from_secs(24 * 60 * 60))
        .allowed_hosts(["localhost", "127.0.0.1"])
        .verbose(true)
        .build()
        .expect("Invalid prerender configuration");

    let app = Router::new()
        .route("/", get(index))
        .fallback(index)
        .layer(Prerender::new(config));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("Failed to bind to port 8080");
    tracing::info!("Listening on http://{}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Server error");
}
