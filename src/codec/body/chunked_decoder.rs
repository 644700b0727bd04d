//! Decoder for chunked transfer encoding
//! ([RFC 7230 §4.1](https://tools.ietf.org/html/rfc7230#section-4.1)).
//!
//! Each chunk is a hexadecimal size line, optionally with extensions, followed
//! by the chunk data and CRLF. A zero-sized chunk ends the body; trailer
//! fields after it are read and discarded.

use crate::protocol::{BodyItem, ParseError};
use bytes::{Buf, Bytes, BytesMut};
use std::task::Poll;
use tokio_util::codec::Decoder;
use tracing::trace;
use ChunkedState::*;

const BAD_CHUNK_SIZE: &str = "invalid chunk size format";
const BAD_CHUNK_BODY: &str = "incorrect body chunk received";

/// A decoder for chunked transfer encoded bodies.
///
/// The state machine consumes input byte by byte and emits chunk data as it
/// becomes available, so a chunk split across transport reads is delivered in
/// pieces without buffering it whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: Size, remaining_size: 0 }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size in hex
    Size,
    /// Whitespace after the size
    SizeLws,
    /// Skip chunk extensions
    Extension,
    /// LF ending the size line
    SizeLf,
    /// Chunk data
    Body,
    /// CR after chunk data
    BodyCr,
    /// LF after chunk data
    BodyLf,
    /// Discard a trailer field
    Trailer,
    /// LF after a trailer field
    TrailerLf,
    /// Final CR
    EndCr,
    /// Final LF
    EndLf,
    /// Message complete
    End,
}

impl Decoder for ChunkedDecoder {
    type Item = BodyItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if self.state == End {
                trace!("finished reading chunked body");
                return Ok(Some(BodyItem::End));
            }

            if src.is_empty() {
                // need more data
                return Ok(None);
            }

            let mut data = None;

            self.state = match self.state.step(src, &mut self.remaining_size, &mut data) {
                Poll::Pending => return Ok(None),
                Poll::Ready(Ok(next)) => next,
                Poll::Ready(Err(e)) => return Err(e),
            };

            if let Some(bytes) = data {
                trace!(len = bytes.len(), "read chunk bytes");
                return Ok(Some(BodyItem::Data(bytes)));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => Err(ParseError::incomplete_message("connection closed in the middle of a chunked body")),
        }
    }
}

macro_rules! try_next_byte {
    ($src:ident) => {{
        if $src.len() > 0 {
            $src.get_u8()
        } else {
            return Poll::Pending;
        }
    }};
}

impl ChunkedState {
    fn step(
        &self,
        src: &mut BytesMut,
        remaining_size: &mut u64,
        data: &mut Option<Bytes>,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        match self {
            Size => ChunkedState::read_size(src, remaining_size),
            SizeLws => ChunkedState::read_size_lws(src),
            Extension => ChunkedState::read_extension(src),
            SizeLf => ChunkedState::read_size_lf(src, remaining_size),
            Body => ChunkedState::read_body(src, remaining_size, data),
            BodyCr => ChunkedState::read_body_cr(src),
            BodyLf => ChunkedState::read_body_lf(src),
            Trailer => ChunkedState::read_trailer(src),
            TrailerLf => ChunkedState::read_trailer_lf(src),
            EndCr => ChunkedState::read_end_cr(src),
            EndLf => ChunkedState::read_end_lf(src),
            End => Poll::Ready(Ok(End)),
        }
    }

    /// Accumulates hex digits of the chunk size until one of `;`, SP, TAB or
    /// CR ends the size token.
    fn read_size(src: &mut BytesMut, size: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        macro_rules! or_overflow {
            ($e:expr) => {
                match $e {
                    Some(val) => val,
                    None => return Poll::Ready(Err(ParseError::invalid_body(BAD_CHUNK_SIZE))),
                }
            };
        }

        let radix = 16;
        match try_next_byte!(src) {
            b @ b'0'..=b'9' => {
                *size = or_overflow!(size.checked_mul(radix));
                *size = or_overflow!(size.checked_add((b - b'0') as u64));
            }
            b @ b'a'..=b'f' => {
                *size = or_overflow!(size.checked_mul(radix));
                *size = or_overflow!(size.checked_add((b + 10 - b'a') as u64));
            }
            b @ b'A'..=b'F' => {
                *size = or_overflow!(size.checked_mul(radix));
                *size = or_overflow!(size.checked_add((b + 10 - b'A') as u64));
            }
            b'\t' | b' ' => return Poll::Ready(Ok(SizeLws)),
            b';' => return Poll::Ready(Ok(Extension)),
            b'\r' => return Poll::Ready(Ok(SizeLf)),
            _ => return Poll::Ready(Err(ParseError::invalid_body(BAD_CHUNK_SIZE))),
        }

        Poll::Ready(Ok(Size))
    }

    /// Whitespace may follow the size, but no further digits.
    fn read_size_lws(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\t' | b' ' => Poll::Ready(Ok(SizeLws)),
            b';' => Poll::Ready(Ok(Extension)),
            b'\r' => Poll::Ready(Ok(SizeLf)),
            _ => Poll::Ready(Err(ParseError::invalid_body(BAD_CHUNK_SIZE))),
        }
    }

    /// Chunk extensions are accepted and ignored; they end at CRLF. A bare LF
    /// inside an extension is rejected.
    fn read_extension(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => Poll::Ready(Err(ParseError::invalid_body(BAD_CHUNK_BODY))),
            _ => Poll::Ready(Ok(Extension)),
        }
    }

    fn read_size_lf(src: &mut BytesMut, size: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => {
                if *size == 0 {
                    // zero-sized chunk is terminal
                    Poll::Ready(Ok(EndCr))
                } else {
                    Poll::Ready(Ok(Body))
                }
            }
            _ => Poll::Ready(Err(ParseError::invalid_body(BAD_CHUNK_BODY))),
        }
    }

    fn read_body(
        src: &mut BytesMut,
        size: &mut u64,
        data: &mut Option<Bytes>,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        if src.is_empty() {
            return Poll::Ready(Ok(Body));
        }

        if *size == 0 {
            return Poll::Ready(Ok(BodyCr));
        }

        let remaining = match *size {
            r if r > usize::MAX as u64 => usize::MAX,
            r => r as usize,
        };

        let read_size = std::cmp::min(remaining, src.len());

        *size -= read_size as u64;
        *data = Some(src.split_to(read_size).freeze());

        if *size > 0 {
            Poll::Ready(Ok(Body))
        } else {
            Poll::Ready(Ok(BodyCr))
        }
    }

    fn read_body_cr(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(BodyLf)),
            _ => Poll::Ready(Err(ParseError::invalid_body(BAD_CHUNK_BODY))),
        }
    }

    fn read_body_lf(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(Size)),
            _ => Poll::Ready(Err(ParseError::invalid_body(BAD_CHUNK_BODY))),
        }
    }

    /// Trailer fields after the last chunk are discarded.
    fn read_trailer(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(TrailerLf)),
            _ => Poll::Ready(Ok(Trailer)),
        }
    }

    fn read_trailer_lf(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(EndCr)),
            _ => Poll::Ready(Err(ParseError::invalid_body(BAD_CHUNK_BODY))),
        }
    }

    fn read_end_cr(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(EndLf)),
            _ => Poll::Ready(Ok(Trailer)),
        }
    }

    fn read_end_lf(src: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(src) {
            b'\n' => Poll::Ready(Ok(End)),
            _ => Poll::Ready(Err(ParseError::invalid_body(BAD_CHUNK_BODY))),
        }
    }
}
