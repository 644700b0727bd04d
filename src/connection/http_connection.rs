use std::error::Error;
use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::StatusCode;
use http_body::Body;
use http_body_util::{BodyExt, Empty};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::body::ReqBody;
use crate::protocol::{
    BodyFraming, BodyItem, HttpError, Message, ParseError, RequestHeader, Response, ResponseHead, SendError,
};

use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info};

/// One server-side HTTP/1.1 connection.
///
/// Decodes requests off the read half, hands each one to the handler with a
/// streaming body, and encodes the response onto the write half. Requests are
/// served back to back on the same connection until the peer stops sending.
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes> + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::Head((header, framing)))) => {
                    self.do_process(header, framing, &handler).await?;
                }

                Some(Ok(Message::Body(_))) => {
                    error!("received body item while expecting a request head");
                    let error_response = build_error_response(StatusCode::BAD_REQUEST);
                    self.do_send_response(error_response).await?;
                    return Err(ParseError::invalid_body("need header while receive body").into());
                }

                Some(Err(e)) => {
                    error!("can't receive next request, cause {}", e);
                    let error_response = build_error_response(e.status());
                    self.do_send_response(error_response).await?;
                    return Err(e.into());
                }

                None => {
                    info!("no more requests, closing this connection down");
                    return Ok(());
                }
            }
        }
    }

    async fn do_process<H>(&mut self, header: RequestHeader, framing: BodyFraming, handler: &Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
        H::RespBody: Body<Data = Bytes> + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        // Reply to "Expect: 100-continue" before the client commits to the body.
        if let Some(value) = header.headers().get("Expect") {
            if value.len() >= 4 && &value.as_bytes()[0..4] == b"100-" {
                let writer = self.framed_write.get_mut();
                writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await.map_err(SendError::io)?;
                writer.flush().await.map_err(SendError::io)?;
                info!("received expect request header, sent continue response");
            }
        }

        let (req_body, body_sender) = ReqBody::create(&mut self.framed_read, framing);
        let request = header.body(req_body);

        // The handler and the body stream have to make progress together: the
        // handler may block on body data while the connection is the only one
        // able to produce it, and the connection must keep draining even when
        // the handler never touches the body.
        let response_result = match body_sender {
            Some(mut sender) => {
                let response_result = {
                    tokio::pin! {
                        let handle_future = handler.call(request);
                        let sender_future = sender.run();
                    }

                    let mut sender_done = false;
                    loop {
                        tokio::select! {
                            // biased ensures we prioritize the handler's response
                            biased;
                            response = &mut handle_future => break response,
                            result = &mut sender_future, if !sender_done => {
                                sender_done = true;
                                if let Err(e) = result {
                                    error!("request body stream failed, {}", e);
                                }
                            }
                        }
                    }
                };

                // drain whatever the handler left unread
                sender.finish().await?;
                response_result
            }
            None => handler.call(request).await,
        };

        self.send_response(response_result).await
    }

    async fn send_response<T, E>(&mut self, response_result: Result<Response<T>, E>) -> Result<(), HttpError>
    where
        T: Body + Unpin,
        T::Error: Display,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        match response_result {
            Ok(response) => self.do_send_response(response).await,
            Err(e) => {
                error!("handle response error, cause: {}", e.into());
                let error_response = build_error_response(StatusCode::INTERNAL_SERVER_ERROR);
                self.do_send_response(error_response).await
            }
        }
    }

    async fn do_send_response<T>(&mut self, response: Response<T>) -> Result<(), HttpError>
    where
        T: Body + Unpin,
        T::Error: Display,
    {
        let (head, mut body) = response.into_parts();

        let framing = {
            let size_hint = body.size_hint();
            match size_hint.exact() {
                Some(0) => BodyFraming::Empty,
                Some(length) => BodyFraming::Length(length),
                None => BodyFraming::Chunked,
            }
        };

        let header = Message::<_, T::Data>::Head((head, framing));
        if !framing.is_empty() {
            // more items follow, batch them up in the write buffer
            self.framed_write.feed(header).await?;
        } else {
            self.framed_write.send(header).await?;
        }

        loop {
            match body.frame().await {
                Some(Ok(frame)) => {
                    let body_item = frame
                        .into_data()
                        .map(BodyItem::Data)
                        .map_err(|_e| SendError::invalid_body("resolve body response error"))?;

                    self.framed_write
                        .send(Message::Body(body_item))
                        .await
                        .map_err(|_e| SendError::invalid_body("can't send response"))?;
                }
                Some(Err(e)) => return Err(SendError::invalid_body(format!("resolve response body error: {e}")).into()),
                None => {
                    self.framed_write
                        .send(Message::Body(BodyItem::<T::Data>::End))
                        .await
                        .map_err(|e| SendError::invalid_body(format!("can't send response end: {}", e)))?;
                    return Ok(());
                }
            }
        }
    }
}

fn build_error_response(status_code: StatusCode) -> Response<Empty<Bytes>> {
    ResponseHead::new(status_code).body(Empty::<Bytes>::new())
}
