use crate::protocol::body::body_channel::{create_body_channel, BodyReceiver, BodySender};
use crate::protocol::{BodyFraming, Message, ParseError, RequestHeader};
use bytes::Bytes;
use futures::Stream;
use http_body::{Body, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};

/// The body of a request as seen by a server-side handler.
///
/// Implements `http_body::Body`; each polled frame asks the connection for
/// the next decoded body item, so the handler and the connection stay in
/// lock-step without buffering the payload.
pub struct ReqBody {
    inner: ReqBodyRepr,
}

pub(crate) enum ReqBodyRepr {
    Receiver(BodyReceiver),
    NoBody,
}

impl ReqBody {
    /// Splits a request body off the connection's message stream.
    ///
    /// Bodiless requests need no channel and return no sender; everything
    /// else returns the connection-side [`BodySender`] that must be driven
    /// while the handler runs.
    pub(crate) fn create<S>(message_stream: &mut S, framing: BodyFraming) -> (ReqBody, Option<BodySender<'_, S>>)
    where
        S: Stream<Item = Result<Message<(RequestHeader, BodyFraming)>, ParseError>> + Unpin,
    {
        match framing {
            BodyFraming::Empty | BodyFraming::Length(0) => (ReqBody::no_body(), None),
            _ => {
                let (sender, receiver) = create_body_channel(message_stream, framing);
                (ReqBody::receiver(receiver), Some(sender))
            }
        }
    }

    pub(crate) fn no_body() -> Self {
        Self { inner: ReqBodyRepr::NoBody }
    }

    pub(crate) fn receiver(receiver: BodyReceiver) -> Self {
        Self { inner: ReqBodyRepr::Receiver(receiver) }
    }
}

impl Body for ReqBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match &mut this.inner {
            ReqBodyRepr::Receiver(body_receiver) => Pin::new(body_receiver).poll_frame(cx),
            ReqBodyRepr::NoBody => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.inner {
            ReqBodyRepr::NoBody => true,
            ReqBodyRepr::Receiver(_) => false,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            ReqBodyRepr::NoBody => SizeHint::with_exact(0),
            ReqBodyRepr::Receiver(body_receiver) => body_receiver.size_hint(),
        }
    }
}

impl std::fmt::Debug for ReqBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            ReqBodyRepr::NoBody => f.write_str("ReqBody::NoBody"),
            ReqBodyRepr::Receiver(_) => f.write_str("ReqBody::Receiver"),
        }
    }
}
