use crate::protocol::{BodyFraming, BodyItem, Message, ParseError, RequestHeader};
use bytes::Bytes;
use futures::{channel::mpsc, Sink, SinkExt, Stream, StreamExt};
use http_body::{Body, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::error;

pub(crate) fn create_body_channel<S>(
    message_stream: &mut S,
    framing: BodyFraming,
) -> (BodySender<'_, S>, BodyReceiver)
where
    S: Stream<Item = Result<Message<(RequestHeader, BodyFraming)>, ParseError>> + Unpin,
{
    let (signal_sender, signal_receiver) = mpsc::channel(8);
    let (data_sender, data_receiver) = mpsc::channel(8);

    (
        BodySender::new(message_stream, signal_receiver, data_sender),
        BodyReceiver::new(signal_sender, data_receiver, framing),
    )
}

pub(crate) enum BodySignal {
    RequestData,
}

/// The connection-side half: feeds body items from the message stream into
/// the data channel whenever the handler side asks for more.
pub(crate) struct BodySender<'conn, S> {
    message_stream: &'conn mut S,
    signal_receiver: mpsc::Receiver<BodySignal>,
    data_sender: mpsc::Sender<Result<BodyItem, ParseError>>,
    eof: bool,
}

impl<'conn, S> BodySender<'conn, S>
where
    S: Stream<Item = Result<Message<(RequestHeader, BodyFraming)>, ParseError>> + Unpin,
{
    pub fn new(
        message_stream: &'conn mut S,
        signal_receiver: mpsc::Receiver<BodySignal>,
        data_sender: mpsc::Sender<Result<BodyItem, ParseError>>,
    ) -> Self {
        Self { message_stream, signal_receiver, data_sender, eof: false }
    }

    /// Serves data requests until the body ends or the handler stops asking.
    pub(crate) async fn run(&mut self) -> Result<(), ParseError> {
        if self.eof {
            return Ok(());
        }

        while let Some(BodySignal::RequestData) = self.signal_receiver.next().await {
            match self.read_item().await {
                Ok(item) => {
                    self.eof = item.is_end();
                    if let Err(e) = self.data_sender.send(Ok(item)).await {
                        error!("failed to send body item through channel, {}", e);
                        return Err(ParseError::invalid_body("send body data error"));
                    }

                    if self.eof {
                        return Ok(());
                    }
                }

                Err(e) => {
                    error!("failed to read item from message stream, {}", e);
                    if let Err(send_error) = self.data_sender.send(Err(e)).await {
                        error!("failed to send error through channel, {}", send_error);
                        return Err(ParseError::invalid_body("failed to send error through channel"));
                    }
                    break;
                }
            }
        }

        self.finish().await
    }

    async fn read_item(&mut self) -> Result<BodyItem, ParseError> {
        match self.message_stream.next().await {
            Some(Ok(Message::Body(item))) => Ok(item),
            Some(Ok(Message::Head(_))) => {
                error!("received a message head in the middle of a body");
                Err(ParseError::invalid_body("received a message head in the middle of a body"))
            }
            Some(Err(e)) => Err(e),
            None => {
                error!("message stream ended in the middle of a body");
                Err(ParseError::invalid_body("message stream ended in the middle of a body"))
            }
        }
    }

    /// Drains body items the handler never read.
    pub(crate) async fn finish(&mut self) -> Result<(), ParseError> {
        if self.eof {
            return Ok(());
        }

        loop {
            match self.read_item().await {
                Ok(item) if item.is_end() => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(_item) => {
                    // drop unread data
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// The handler-side half: an `http_body::Body` that requests one item at a
/// time from the connection.
#[derive(Debug)]
pub(crate) struct BodyReceiver {
    signal_sender: mpsc::Sender<BodySignal>,
    data_receiver: mpsc::Receiver<Result<BodyItem, ParseError>>,
    framing: BodyFraming,
    in_flight: bool,
}

impl BodyReceiver {
    pub(crate) fn new(
        signal_sender: mpsc::Sender<BodySignal>,
        data_receiver: mpsc::Receiver<Result<BodyItem, ParseError>>,
        framing: BodyFraming,
    ) -> Self {
        Self { signal_sender, data_receiver, framing, in_flight: false }
    }
}

impl Body for BodyReceiver {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if !this.in_flight {
            match Pin::new(&mut this.signal_sender).poll_ready(cx) {
                Poll::Ready(Ok(())) => {
                    if let Err(e) = Pin::new(&mut this.signal_sender).start_send(BodySignal::RequestData) {
                        error!("failed to send data request through channel, {}", e);
                        return Poll::Ready(Some(Err(ParseError::invalid_body(
                            "failed to send signal when receiving body data",
                        ))));
                    }
                    this.in_flight = true;
                }
                Poll::Ready(Err(e)) => {
                    error!("failed to prepare data request through channel, {}", e);
                    return Poll::Ready(Some(Err(ParseError::invalid_body(
                        "failed to send signal when receiving body data",
                    ))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }

        match this.data_receiver.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(BodyItem::Data(bytes)))) => {
                this.in_flight = false;
                Poll::Ready(Some(Ok(Frame::data(bytes))))
            }
            Poll::Ready(Some(Ok(BodyItem::End))) => {
                this.in_flight = false;
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                this.in_flight = false;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.in_flight = false;
                Poll::Ready(Some(Err(ParseError::invalid_body("body channel closed while expecting data"))))
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self.framing {
            BodyFraming::Length(length) => SizeHint::with_exact(length),
            BodyFraming::Empty => SizeHint::with_exact(0),
            BodyFraming::Chunked | BodyFraming::UntilClose => SizeHint::new(),
        }
    }
}
