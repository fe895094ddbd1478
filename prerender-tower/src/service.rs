use std::task::{Context, Poll};

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{Either, Full};
use prerender::RenderProxy;
use prerender::metrics::{self, Route};
use tower::Service;
use tracing::debug;

use crate::future::PrerenderFuture;

/// Service answering bots with rendered pages and passing everything else to
/// the wrapped service.
///
/// The request body is never read on the render path; it is dropped together
/// with the request.
#[derive(Debug, Clone)]
pub struct PrerenderService<S> {
    upstream: S,
    proxy: RenderProxy,
}

impl<S> PrerenderService<S> {
    /// Wraps `upstream`.
    pub fn new(upstream: S, proxy: RenderProxy) -> Self {
        PrerenderService { upstream, proxy }
    }

    /// The wrapped service.
    pub fn get_ref(&self) -> &S {
        &self.upstream
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for PrerenderService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = Response<Either<Full<Bytes>, ResBody>>;
    type Error = S::Error;
    type Future = PrerenderFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.upstream.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let detector = self.proxy.detector();
        if !detector.should_render(req.uri(), req.headers()) {
            metrics::record_request(Route::Passthrough);
            return PrerenderFuture::passthrough(self.upstream.call(req));
        }

        metrics::record_request(Route::Render);
        if self.proxy.config().verbose() {
            debug!(uri = %req.uri(), "rendering request for bot");
        }
        let (parts, _body) = req.into_parts();
        let proxy = self.proxy.clone();
        PrerenderFuture::render(Box::pin(async move { proxy.serve(&parts).await }))
    }
}
