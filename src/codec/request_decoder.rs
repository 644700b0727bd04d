//! Message-level request decoder (server side).
//!
//! Drives the two phases of receiving one request: the header block via
//! [`RequestHeaderDecoder`], then the body via [`BodyDecoder`]. Used with
//! `FramedRead` by the connection loop.

use crate::codec::body::BodyDecoder;
use crate::codec::header::RequestHeaderDecoder;
use crate::protocol::{BodyFraming, BodyItem, Message, ParseError, RequestHeader};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder emitting one [`Message::Head`] per request, followed by its
/// [`Message::Body`] items up to and including [`BodyItem::End`].
///
/// The current phase is tracked through `body_decoder`: `None` while parsing
/// headers, `Some` while the body is being streamed.
pub struct RequestDecoder {
    header_decoder: RequestHeaderDecoder,
    body_decoder: Option<BodyDecoder>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { header_decoder: RequestHeaderDecoder, body_decoder: None }
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<(RequestHeader, BodyFraming)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(body_decoder) = &mut self.body_decoder {
            let message = match body_decoder.decode(src)? {
                Some(item @ BodyItem::Data(_)) => Some(Message::Body(item)),
                Some(item @ BodyItem::End) => {
                    // body finished, next decode starts the following request
                    self.body_decoder.take();
                    Some(Message::Body(item))
                }
                None => None,
            };

            return Ok(message);
        }

        let message = match self.header_decoder.decode(src)? {
            Some((header, framing)) => {
                // bodiless requests go straight back to the header phase, so
                // the next decode starts the following request
                if !matches!(framing, BodyFraming::Empty | BodyFraming::Length(0)) {
                    self.body_decoder = Some(framing.into());
                }
                Some(Message::Head((header, framing)))
            }
            None => None,
        };

        Ok(message)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(body_decoder) = &mut self.body_decoder {
            let message = match body_decoder.decode_eof(src)? {
                Some(item @ BodyItem::Data(_)) => Some(Message::Body(item)),
                Some(item @ BodyItem::End) => {
                    self.body_decoder.take();
                    Some(Message::Body(item))
                }
                None => None,
            };
            return Ok(message);
        }

        if src.is_empty() {
            return Ok(None);
        }
        self.decode(src)
    }
}
