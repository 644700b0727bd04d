//! Decoder for bodies delimited by `Content-Length`
//! ([RFC 7230 §3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2)).

use std::cmp;

use crate::protocol::{BodyItem, ParseError};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for a body of known length.
///
/// Tracks how many bytes remain and never yields more than the declared
/// length; surplus input stays in the buffer for the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    length: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { length }
    }
}

impl Decoder for LengthDecoder {
    type Item = BodyItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.length == 0 {
            return Ok(Some(BodyItem::End));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let len = cmp::min(self.length, src.len() as u64);
        let bytes = src.split_to(len as usize).freeze();

        self.length -= bytes.len() as u64;
        Ok(Some(BodyItem::Data(bytes)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => Err(ParseError::incomplete_message("connection closed before content-length was satisfied")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let mut buffer: BytesMut = BytesMut::from(&b"101234567890abcdef\r\n\r\n"[..]);

        let mut decoder = LengthDecoder::new(10);
        let item = decoder.decode(&mut buffer).unwrap().unwrap();

        assert_eq!(item.as_data().unwrap(), &bytes::Bytes::copy_from_slice(b"1012345678"));
        assert_eq!(&buffer[..], b"90abcdef\r\n\r\n");

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(item.is_end());
        assert_eq!(&buffer[..], b"90abcdef\r\n\r\n");
    }

    #[test]
    fn test_zero_length_is_end_immediately() {
        let mut buffer = BytesMut::new();
        let mut decoder = LengthDecoder::new(0);

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_end());
    }

    #[test]
    fn test_eof_before_length_met() {
        let mut buffer: BytesMut = BytesMut::from(&b"abc"[..]);
        let mut decoder = LengthDecoder::new(10);

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(item.as_data().unwrap().len(), 3);

        assert!(decoder.decode_eof(&mut buffer).is_err());
    }
}
