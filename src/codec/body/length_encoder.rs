//! Encoder for bodies delimited by `Content-Length`.

use crate::protocol::{BodyItem, SendError};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

/// An encoder that passes body data through up to the declared length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthEncoder {
    received_eof: bool,
    length: u64,
}

impl LengthEncoder {
    pub fn new(length: u64) -> Self {
        Self { received_eof: false, length }
    }

    pub fn is_finished(&self) -> bool {
        self.length == 0 && self.received_eof
    }
}

impl<D: Buf> Encoder<BodyItem<D>> for LengthEncoder {
    type Error = SendError;

    fn encode(&mut self, item: BodyItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.length == 0 && !item.is_end() {
            warn!("discarding body data beyond the declared content-length");
            return Ok(());
        }

        match item {
            BodyItem::Data(bytes) => {
                if !bytes.has_remaining() {
                    return Ok(());
                }
                if bytes.remaining() as u64 > self.length {
                    return Err(SendError::invalid_body("body exceeds the declared content-length"));
                }
                dst.extend_from_slice(bytes.chunk());
                self.length -= bytes.remaining() as u64;
                Ok(())
            }
            BodyItem::End => {
                if self.length > 0 {
                    return Err(SendError::invalid_body("body ended before the declared content-length"));
                }
                self.received_eof = true;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn passes_exact_length_through() {
        let mut encoder = LengthEncoder::new(10);
        let mut dst = BytesMut::new();

        encoder.encode(BodyItem::Data(Bytes::from_static(b"12345")), &mut dst).unwrap();
        encoder.encode(BodyItem::Data(Bytes::from_static(b"67890")), &mut dst).unwrap();
        encoder.encode(BodyItem::<Bytes>::End, &mut dst).unwrap();

        assert!(encoder.is_finished());
        assert_eq!(&dst[..], &b"1234567890"[..]);
    }

    #[test]
    fn rejects_short_body() {
        let mut encoder = LengthEncoder::new(10);
        let mut dst = BytesMut::new();

        encoder.encode(BodyItem::Data(Bytes::from_static(b"12345")), &mut dst).unwrap();
        assert!(encoder.encode(BodyItem::<Bytes>::End, &mut dst).is_err());
    }

    #[test]
    fn rejects_oversized_chunk() {
        let mut encoder = LengthEncoder::new(3);
        let mut dst = BytesMut::new();

        assert!(encoder.encode(BodyItem::Data(Bytes::from_static(b"12345")), &mut dst).is_err());
    }
}
