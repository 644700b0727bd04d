//! Decoder for request start lines and header blocks (server side).

use bytes::BytesMut;
use http::{Method, Version};
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{BodyFraming, Headers, ParseError, RequestHeader};

pub(crate) const MAX_HEADER_NUM: usize = 64;
pub(crate) const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Parses a request head out of the buffer.
///
/// Returns `None` until a full header block is buffered. On success the
/// header bytes are consumed and the buffer starts at the first body byte,
/// with the body framing determined from the headers.
pub struct RequestHeaderDecoder;

impl Decoder for RequestHeaderDecoder {
    type Item = (RequestHeader, BodyFraming);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let (header, body_offset) = {
            let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
            let mut req = httparse::Request::new(&mut headers);

            let parsed = req.parse(src.as_ref()).map_err(|e| match e {
                httparse::Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
                e => ParseError::invalid_header(e.to_string()),
            })?;

            match parsed {
                Status::Complete(body_offset) => {
                    ensure!(
                        body_offset <= MAX_HEADER_BYTES,
                        ParseError::too_large_header(body_offset, MAX_HEADER_BYTES)
                    );

                    let method = req
                        .method
                        .and_then(|m| Method::from_bytes(m.as_bytes()).ok())
                        .ok_or(ParseError::InvalidMethod)?;
                    let target = req.path.ok_or(ParseError::InvalidTarget)?.to_string();
                    let version = match req.version {
                        Some(1) => Version::HTTP_11,
                        Some(0) => Version::HTTP_10,
                        // http2/3 start lines never reach this decoder
                        v => return Err(ParseError::InvalidVersion(v)),
                    };

                    let mut header_map = Headers::with_capacity(req.headers.len());
                    for header in req.headers.iter() {
                        header_map.append(header.name, String::from_utf8_lossy(header.value).into_owned());
                    }

                    (RequestHeader::new(method, target, version, header_map), body_offset)
                }
                Status::Partial => {
                    ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                    return Ok(None);
                }
            }
        };

        let _ = src.split_to(body_offset);
        trace!(body_offset, "request headers complete");

        let framing = request_framing(&header)?;
        Ok(Some((header, framing)))
    }
}

/// Determines how the request body is delimited.
///
/// See [RFC 7230 §3.3](https://www.rfc-editor.org/rfc/rfc7230#section-3.3):
/// a request with both `Transfer-Encoding` and `Content-Length` is rejected.
fn request_framing(header: &RequestHeader) -> Result<BodyFraming, ParseError> {
    if !header.need_body() {
        return Ok(BodyFraming::Empty);
    }

    let te_present = header.headers().contains("Transfer-Encoding");
    let content_length = header.headers().content_length();

    match (te_present, content_length?) {
        (false, None) => Ok(BodyFraming::Empty),

        (true, None) => {
            if header.headers().is_chunked() {
                Ok(BodyFraming::Chunked)
            } else {
                Ok(BodyFraming::Empty)
            }
        }

        (false, Some(length)) => Ok(BodyFraming::Length(length)),

        (true, Some(_)) => {
            Err(ParseError::invalid_content_length("transfer_encoding and content_length both present in headers"))
        }
    }
}
