use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::ready;
use http::Response;
use http_body_util::{Either, Full};
use pin_project::pin_project;

/// Response future of [`PrerenderService`](crate::PrerenderService).
///
/// Either drives the render proxy or the wrapped service and maps the body
/// into the common [`Either`] type.
#[pin_project(project = PrerenderFutureProj)]
pub enum PrerenderFuture<F> {
    /// Answered by the render proxy.
    Render {
        /// Render pipeline.
        #[pin]
        inner: BoxFuture<'static, Response<Full<Bytes>>>,
    },
    /// Answered by the wrapped service.
    Passthrough {
        /// Wrapped service future.
        #[pin]
        inner: F,
    },
}

impl<F> PrerenderFuture<F> {
    pub(crate) fn render(inner: BoxFuture<'static, Response<Full<Bytes>>>) -> Self {
        PrerenderFuture::Render { inner }
    }

    pub(crate) fn passthrough(inner: F) -> Self {
        PrerenderFuture::Passthrough { inner }
    }
}

impl<F, ResBody, E> Future for PrerenderFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = Result<Response<Either<Full<Bytes>, ResBody>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            PrerenderFutureProj::Render { inner } => {
                let response = ready!(inner.poll(cx));
                Poll::Ready(Ok(response.map(Either::Left)))
            }
            PrerenderFutureProj::Passthrough { inner } => {
                let response = ready!(inner.poll(cx))?;
                Poll::Ready(Ok(response.map(Either::Right)))
            }
        }
    }
}
