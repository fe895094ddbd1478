//! Client side of the rendering service.
//!
//! The service is asked for `GET <base>/ssr?url=<page url>` and answers with the
//! rendered HTML. Status and body are relayed as they are.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::trace;

use crate::page::CachedPage;

/// Failure to obtain a rendered page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The service did not answer within the configured deadline.
    #[error("render request timed out after {0:?}")]
    Timeout(Duration),
    /// Connecting to the service or sending the request failed.
    #[error("render request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// The response body could not be read.
    #[error("failed to read rendered page: {0}")]
    Body(#[source] reqwest::Error),
    /// The page URL could not be encoded into a service request.
    #[error("invalid page url: {0}")]
    InvalidUrl(String),
}

/// Produces rendered pages.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders the page at `url`.
    async fn render(&self, url: &str) -> Result<CachedPage, RenderError>;
}

/// [`Renderer`] talking HTTP to a rendering service such as Rendertron or a
/// Puppeteer endpoint.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
    base: String,
}

impl HttpRenderer {
    /// Creates a renderer for the service at `base` with its own HTTP client.
    pub fn new(base: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("prerender/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base))
    }

    /// Creates a renderer sharing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            client,
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    /// URL of the service request that renders `url`.
    pub fn render_url(&self, url: &str) -> Result<String, RenderError> {
        let query = serde_urlencoded::to_string([("url", url)])
            .map_err(|err| RenderError::InvalidUrl(err.to_string()))?;
        Ok(format!("{}/ssr?{query}", self.base))
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<CachedPage, RenderError> {
        let request_url = self.render_url(url)?;
        trace!(%request_url, "render request");

        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(RenderError::Transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(RenderError::Body)?;
        trace!(%status, bytes = body.len(), "render response");

        Ok(CachedPage::new(status, &headers, body))
    }
}
