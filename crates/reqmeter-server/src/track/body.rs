use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};

use super::Completion;

/// Response body that fires its [`Completion`] at end-of-stream.
///
/// Bodies the server never polls are recorded on drop: empty bodies, and
/// responses flagged bodyless (`HEAD`, 1xx, 204, 304) whatever the inner body
/// still holds.
pub struct TrackedBody {
    inner: Body,
    completion: Option<Completion>,
}

impl TrackedBody {
    pub fn new(inner: Body, completion: Completion) -> Self {
        Self {
            inner,
            completion: Some(completion),
        }
    }

    fn finish(&mut self) {
        if let Some(c) = self.completion.take() {
            c.record();
        }
    }
}

impl HttpBody for TrackedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) => this.finish(),
            Poll::Ready(Some(Ok(_))) if this.inner.is_end_stream() => this.finish(),
            // a failed body never completed
            Poll::Ready(Some(Err(_))) => this.completion = None,
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        let bodyless = self.completion.as_ref().is_some_and(|c| c.bodyless);
        if bodyless || self.inner.is_end_stream() {
            self.finish();
        }
    }
}
