//! Decoder for response status lines and header blocks (client side).
//!
//! This is the incremental half of response parsing: feed it buffered bytes
//! and it answers `None` until the header block is complete. When it
//! completes, the header bytes are consumed from the buffer — whatever
//! remains starts at the first body byte, which the caller hands back to the
//! pushback reader before constructing the
//! [`BodyReader`](crate::client::BodyReader).

use bytes::BytesMut;
use http::{StatusCode, Version};
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::request_decoder::{MAX_HEADER_BYTES, MAX_HEADER_NUM};
use crate::ensure;
use crate::protocol::{BodyFraming, Headers, ParseError, ResponseHead};

/// Parses a response head out of the buffer.
pub struct ResponseHeaderDecoder;

impl Decoder for ResponseHeaderDecoder {
    type Item = (ResponseHead, BodyFraming);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let (head, body_offset) = {
            let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
            let mut resp = httparse::Response::new(&mut headers);

            let parsed = resp.parse(src.as_ref()).map_err(|e| match e {
                httparse::Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
                e => ParseError::invalid_header(e.to_string()),
            })?;

            match parsed {
                Status::Complete(body_offset) => {
                    ensure!(
                        body_offset <= MAX_HEADER_BYTES,
                        ParseError::too_large_header(body_offset, MAX_HEADER_BYTES)
                    );

                    let status = resp
                        .code
                        .and_then(|code| StatusCode::from_u16(code).ok())
                        .ok_or(ParseError::InvalidStatus)?;
                    let version = match resp.version {
                        Some(1) => Version::HTTP_11,
                        Some(0) => Version::HTTP_10,
                        v => return Err(ParseError::InvalidVersion(v)),
                    };

                    let mut head = ResponseHead::new(status);
                    head.set_version(version);
                    // an empty reason phrase falls back to the canonical one
                    if let Some(reason) = resp.reason.filter(|r| !r.is_empty()) {
                        head.set_reason(reason);
                    }
                    for header in resp.headers.iter() {
                        head.headers_mut().append(header.name, String::from_utf8_lossy(header.value).into_owned());
                    }

                    (head, body_offset)
                }
                Status::Partial => {
                    ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                    return Ok(None);
                }
            }
        };

        let _ = src.split_to(body_offset);
        trace!(status = %head.status(), body_offset, "response headers complete");

        let framing = response_framing(&head)?;
        Ok(Some((head, framing)))
    }
}

/// Determines how the response body is delimited.
///
/// `Transfer-Encoding: chunked` wins over `Content-Length`; with neither, the
/// body runs until the connection closes. 1xx, 204 and 304 never carry one.
fn response_framing(head: &ResponseHead) -> Result<BodyFraming, ParseError> {
    let status = head.status();
    if status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        return Ok(BodyFraming::Empty);
    }

    if head.headers().is_chunked() {
        return Ok(BodyFraming::Chunked);
    }

    match head.headers().content_length()? {
        Some(length) => Ok(BodyFraming::Length(length)),
        None => Ok(BodyFraming::UntilClose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_response_head() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n"[..]);

        let (head, framing) = ResponseHeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(head.status(), StatusCode::CREATED);
        assert_eq!(head.reason(), "Created");
        assert_eq!(head.version(), Version::HTTP_11);
        assert_eq!(head.headers().get("Content-Length"), Some("0"));
        assert_eq!(framing, BodyFraming::Length(0));
        assert!(buf.is_empty());
    }

    #[test]
    fn body_bytes_stay_in_the_buffer() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhelloNEXT"[..]);

        let (_, framing) = ResponseHeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(framing, BodyFraming::Length(5));
        assert_eq!(&buf[..], b"helloNEXT");
    }

    #[test]
    fn partial_head_answers_none() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-"[..]);
        assert!(ResponseHeaderDecoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"Length: 0\r\n\r\n");
        assert!(ResponseHeaderDecoder.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn chunked_wins_over_content_length() {
        let mut buf = BytesMut::from(
            &b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nTransfer-Encoding: chunked\r\n\r\n"[..],
        );

        let (_, framing) = ResponseHeaderDecoder.decode(&mut buf).unwrap().unwrap();
        assert!(framing.is_chunked());
    }

    #[test]
    fn missing_framing_headers_mean_until_close() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\n\r\nrest of stream"[..]);

        let (_, framing) = ResponseHeaderDecoder.decode(&mut buf).unwrap().unwrap();
        assert!(framing.is_until_close());
    }

    #[test]
    fn no_content_has_no_body() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 204 No Content\r\n\r\n"[..]);

        let (_, framing) = ResponseHeaderDecoder.decode(&mut buf).unwrap().unwrap();
        assert!(framing.is_empty());
    }

    #[test]
    fn custom_reason_phrase_is_kept() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 Fine By Me\r\nContent-Length: 0\r\n\r\n"[..]);

        let (head, _) = ResponseHeaderDecoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(head.reason(), "Fine By Me");
    }

    #[test]
    fn garbage_start_line_is_an_error() {
        let mut buf = BytesMut::from(&b"NOT-HTTP\r\n\r\n"[..]);
        assert!(ResponseHeaderDecoder.decode(&mut buf).is_err());
    }
}
