//! Unified decoder for message bodies.
//!
//! Dispatches to the framing-specific decoder: fixed length, chunked,
//! read-until-close, or no body at all. The response receiver hands an
//! instance of this to the [`BodyReader`](crate::client::BodyReader) once the
//! header block is complete.

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{BodyFraming, BodyItem, ParseError};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for any body framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyDecoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Fixed content length
    Length(LengthDecoder),

    /// Chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Body runs until the peer closes the connection
    UntilClose,

    /// No body
    NoBody,
}

impl BodyDecoder {
    /// Creates a decoder for messages with no body.
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    /// Creates a decoder for chunked transfer encoding.
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    /// Creates a decoder for a fixed-length body.
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Creates a decoder for a body delimited by connection close.
    pub fn until_close() -> Self {
        Self { kind: Kind::UntilClose }
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }

    pub fn is_fix_length(&self) -> bool {
        matches!(self.kind, Kind::Length(_))
    }
}

impl From<BodyFraming> for BodyDecoder {
    fn from(framing: BodyFraming) -> Self {
        match framing {
            BodyFraming::Empty => BodyDecoder::empty(),
            BodyFraming::Length(size) => BodyDecoder::fix_length(size),
            BodyFraming::Chunked => BodyDecoder::chunked(),
            BodyFraming::UntilClose => BodyDecoder::until_close(),
        }
    }
}

impl Decoder for BodyDecoder {
    type Item = BodyItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            Kind::UntilClose => {
                if src.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(BodyItem::Data(src.split_to(src.len()).freeze())))
                }
            }
            Kind::NoBody => Ok(Some(BodyItem::End)),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode_eof(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode_eof(src),
            Kind::UntilClose => {
                if src.is_empty() {
                    // the connection ending is what completes this message
                    Ok(Some(BodyItem::End))
                } else {
                    Ok(Some(BodyItem::Data(src.split_to(src.len()).freeze())))
                }
            }
            Kind::NoBody => Ok(Some(BodyItem::End)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_body_ends_immediately() {
        let mut decoder = BodyDecoder::empty();
        assert!(decoder.decode(&mut BytesMut::new()).unwrap().unwrap().is_end());
    }

    #[test]
    fn until_close_yields_everything_then_ends_on_eof() {
        let mut decoder = BodyDecoder::until_close();
        let mut buffer = BytesMut::from(&b"some data"[..]);

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(item.as_data().unwrap(), &bytes::Bytes::copy_from_slice(b"some data"));

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(decoder.decode_eof(&mut buffer).unwrap().unwrap().is_end());
    }

    #[test]
    fn dispatches_by_framing() {
        assert!(BodyDecoder::from(BodyFraming::Empty).is_empty());
        assert!(BodyDecoder::from(BodyFraming::Chunked).is_chunked());
        assert!(BodyDecoder::from(BodyFraming::Length(3)).is_fix_length());
    }
}
