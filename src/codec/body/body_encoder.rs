//! Unified encoder for message bodies.

use crate::codec::body::chunked_encoder::ChunkedEncoder;
use crate::codec::body::length_encoder::LengthEncoder;
use crate::protocol::{BodyFraming, BodyItem, SendError};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;

/// An encoder for any outbound body framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Fixed content length
    Length(LengthEncoder),

    /// Chunked transfer encoding
    Chunked(ChunkedEncoder),

    /// No body
    NoBody,
}

impl BodyEncoder {
    /// Creates an encoder for messages with no body.
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    /// Creates an encoder for chunked transfer encoding.
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedEncoder::new()) }
    }

    /// Creates an encoder for a fixed-length body.
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthEncoder::new(size)) }
    }

    /// Returns whether the body is fully written.
    pub fn is_finished(&self) -> bool {
        match &self.kind {
            Kind::Length(encoder) => encoder.is_finished(),
            Kind::Chunked(encoder) => encoder.is_finished(),
            Kind::NoBody => true,
        }
    }
}

impl From<BodyFraming> for BodyEncoder {
    fn from(framing: BodyFraming) -> Self {
        match framing {
            BodyFraming::Length(size) => BodyEncoder::fix_length(size),
            BodyFraming::Chunked => BodyEncoder::chunked(),
            // a response that runs until close is framed by the transport,
            // not by the encoder
            BodyFraming::Empty | BodyFraming::UntilClose => BodyEncoder::empty(),
        }
    }
}

impl<D: Buf> Encoder<BodyItem<D>> for BodyEncoder {
    type Error = SendError;

    fn encode(&mut self, item: BodyItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match &mut self.kind {
            Kind::Length(encoder) => encoder.encode(item, dst),
            Kind::Chunked(encoder) => encoder.encode(item, dst),
            Kind::NoBody => {
                if item.is_data() {
                    return Err(SendError::invalid_body("message declared no body but data was supplied"));
                }
                Ok(())
            }
        }
    }
}
