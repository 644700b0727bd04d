//! Message-level response encoder (server side).

use crate::codec::body::BodyEncoder;
use crate::codec::header::ResponseHeaderEncoder;
use crate::protocol::{BodyFraming, Message, ResponseHead, SendError};
use bytes::{Buf, BytesMut};
use std::io;
use std::io::ErrorKind;
use tokio_util::codec::Encoder;
use tracing::error;

/// An encoder accepting one [`Message::Head`] per response, followed by its
/// body items. Out-of-phase items are rejected.
pub struct ResponseEncoder {
    header_encoder: ResponseHeaderEncoder,
    body_encoder: Option<BodyEncoder>,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self { header_encoder: ResponseHeaderEncoder, body_encoder: None }
    }
}

impl<D: Buf> Encoder<Message<(ResponseHead, BodyFraming), D>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message<(ResponseHead, BodyFraming), D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Head((head, framing)) => {
                if self.body_encoder.is_some() {
                    error!("expect body item but receive response head");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                }

                self.body_encoder = Some(framing.into());
                self.header_encoder.encode((head, framing), dst)
            }

            Message::Body(body_item) => {
                let body_encoder = if let Some(encoder) = &mut self.body_encoder {
                    encoder
                } else {
                    error!("expect response head but receive body item");
                    return Err(io::Error::from(ErrorKind::InvalidInput).into());
                };

                let result = body_encoder.encode(body_item, dst);

                if body_encoder.is_finished() {
                    self.body_encoder.take();
                }

                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::BodyItem;
    use bytes::Bytes;
    use http::StatusCode;

    #[test]
    fn encodes_a_full_response() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        let head = ResponseHead::new(StatusCode::OK);
        encoder.encode(Message::<_, Bytes>::Head((head, BodyFraming::Length(5))), &mut dst).unwrap();
        encoder.encode(Message::Body(BodyItem::Data(Bytes::from_static(b"hello"))), &mut dst).unwrap();
        encoder.encode(Message::<(ResponseHead, BodyFraming), Bytes>::Body(BodyItem::End), &mut dst).unwrap();

        assert_eq!(&dst[..], &b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello"[..]);
    }

    #[test]
    fn rejects_body_before_head() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        let result = encoder.encode(
            Message::<(ResponseHead, BodyFraming), Bytes>::Body(BodyItem::Data(Bytes::from_static(b"x"))),
            &mut dst,
        );
        assert!(result.is_err());
    }

    #[test]
    fn back_to_back_responses() {
        let mut encoder = ResponseEncoder::new();
        let mut dst = BytesMut::new();

        let head = ResponseHead::new(StatusCode::NO_CONTENT);
        encoder.encode(Message::<_, Bytes>::Head((head, BodyFraming::Empty)), &mut dst).unwrap();
        encoder.encode(Message::<(ResponseHead, BodyFraming), Bytes>::Body(BodyItem::End), &mut dst).unwrap();

        let head = ResponseHead::new(StatusCode::OK);
        encoder.encode(Message::<_, Bytes>::Head((head, BodyFraming::Empty)), &mut dst).unwrap();

        let text = std::str::from_utf8(&dst[..]).unwrap();
        assert_eq!(text.matches("HTTP/1.1").count(), 2);
    }
}
