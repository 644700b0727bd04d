//! Encoder for response status lines and header blocks (server side).

use crate::protocol::{BodyFraming, ResponseHead, SendError};

use bytes::{BufMut, BytesMut};
use http::Version;
use std::io;
use std::io::ErrorKind;
use tokio_util::codec::Encoder;
use tracing::error;

const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Writes the status line, the stored headers and the framing header
/// (`Content-Length` or `Transfer-Encoding: chunked`) derived from the body.
pub struct ResponseHeaderEncoder;

impl Encoder<(ResponseHead, BodyFraming)> for ResponseHeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, BodyFraming), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, framing) = item;

        dst.reserve(INIT_HEADER_SIZE);
        match head.version() {
            Version::HTTP_11 => {
                dst.put_slice(b"HTTP/1.1 ");
                dst.put_slice(head.status().as_str().as_bytes());
                dst.put_slice(b" ");
                dst.put_slice(head.reason().as_bytes());
                dst.put_slice(b"\r\n");
            }
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(ErrorKind::Unsupported).into());
            }
        }

        match framing {
            BodyFraming::Length(n) => head.headers_mut().set("Content-Length", n.to_string()),
            BodyFraming::Chunked => head.headers_mut().set("Transfer-Encoding", "chunked"),
            BodyFraming::Empty => head.headers_mut().set("Content-Length", "0"),
            BodyFraming::UntilClose => {}
        }

        for (name, value) in head.headers().iter() {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn encodes_status_line_and_framing_header() {
        let head = ResponseHead::new(StatusCode::OK).header("Server", "wirehttp");

        let mut dst = BytesMut::new();
        ResponseHeaderEncoder.encode((head, BodyFraming::Length(5)), &mut dst).unwrap();

        assert_eq!(&dst[..], &b"HTTP/1.1 200 OK\r\nServer: wirehttp\r\nContent-Length: 5\r\n\r\n"[..]);
    }

    #[test]
    fn replaces_existing_framing_header() {
        let head = ResponseHead::new(StatusCode::OK).header("Content-Length", "999");

        let mut dst = BytesMut::new();
        ResponseHeaderEncoder.encode((head, BodyFraming::Empty), &mut dst).unwrap();

        assert_eq!(&dst[..], &b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n"[..]);
    }

    #[test]
    fn encodes_chunked_framing() {
        let head = ResponseHead::new(StatusCode::OK);

        let mut dst = BytesMut::new();
        ResponseHeaderEncoder.encode((head, BodyFraming::Chunked), &mut dst).unwrap();

        assert_eq!(&dst[..], &b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n"[..]);
    }
}
