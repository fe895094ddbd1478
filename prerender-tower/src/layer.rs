use prerender::{Config, RenderProxy};
use tower::Layer;

use crate::service::PrerenderService;

/// Layer wrapping services with [`PrerenderService`].
///
/// All services produced by one layer share the same [`RenderProxy`], and with
/// it the cache store and the rendering service client.
#[derive(Debug, Clone)]
pub struct Prerender {
    proxy: RenderProxy,
}

impl Prerender {
    /// Creates a layer for the given configuration.
    pub fn new(config: Config) -> Self {
        Self::from_proxy(RenderProxy::new(config))
    }

    /// Creates a layer around an existing proxy.
    pub fn from_proxy(proxy: RenderProxy) -> Self {
        Self { proxy }
    }

    /// Proxy answering rendered requests.
    pub fn proxy(&self) -> &RenderProxy {
        &self.proxy
    }
}

impl<S> Layer<S> for Prerender {
    type Service = PrerenderService<S>;

    fn layer(&self, upstream: S) -> Self::Service {
        PrerenderService::new(upstream, self.proxy.clone())
    }
}
