//! Streaming response body.
//!
//! A [`BodyReader`] owns the pushback reader and the body decoder that the
//! response receiver hands over once the header block is complete. Reads pull
//! transport bytes through the decoder on demand; nothing is buffered ahead
//! of what the caller asks for.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::codec::Decoder;
use tokio_util::io::poll_read_buf;

use crate::codec::body::BodyDecoder;
use crate::io::PushbackReader;
use crate::protocol::BodyItem;

/// An `AsyncRead` over a message body.
///
/// `read` returns `0` exactly when the body is complete and stays at EOF
/// afterwards. When the decoder finds the end of the message, any surplus
/// bytes already read from the transport (trailer tail, or the start of the
/// next message) are pushed back to the reader first, so the connection can
/// be reused.
#[derive(Debug)]
pub struct BodyReader<R> {
    reader: PushbackReader<R>,
    decoder: BodyDecoder,
    buffer: BytesMut,
    pending: Bytes,
    eof: bool,
}

impl<R> BodyReader<R> {
    pub fn new(reader: PushbackReader<R>, decoder: BodyDecoder) -> Self {
        Self { reader, decoder, buffer: BytesMut::new(), pending: Bytes::new(), eof: false }
    }

    /// Returns whether the body has been read to completion.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Releases the underlying reader, e.g. to issue the next request on the
    /// same connection. Bytes beyond the body have already been pushed back.
    pub fn into_inner(self) -> PushbackReader<R> {
        self.reader
    }

    fn finish(&mut self) {
        self.eof = true;
        if !self.buffer.is_empty() {
            self.reader.unread(&self.buffer);
            self.buffer.clear();
        }
    }
}

impl<R> AsyncRead for BodyReader<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            if !this.pending.is_empty() {
                let n = std::cmp::min(this.pending.len(), buf.remaining());
                buf.put_slice(&this.pending[..n]);
                this.pending.advance(n);
                return Poll::Ready(Ok(()));
            }

            if this.eof {
                return Poll::Ready(Ok(()));
            }

            match this.decoder.decode(&mut this.buffer) {
                Ok(Some(BodyItem::Data(data))) => {
                    this.pending = data;
                    continue;
                }
                Ok(Some(BodyItem::End)) => {
                    this.finish();
                    return Poll::Ready(Ok(()));
                }
                Ok(None) => {}
                Err(e) => return Poll::Ready(Err(io::Error::new(io::ErrorKind::InvalidData, e))),
            }

            match poll_read_buf(Pin::new(&mut this.reader), cx, &mut this.buffer) {
                Poll::Ready(Ok(0)) => match this.decoder.decode_eof(&mut this.buffer) {
                    Ok(Some(BodyItem::Data(data))) => {
                        this.pending = data;
                        continue;
                    }
                    Ok(Some(BodyItem::End)) | Ok(None) => {
                        this.finish();
                        return Poll::Ready(Ok(()));
                    }
                    Err(e) => return Poll::Ready(Err(io::Error::new(io::ErrorKind::InvalidData, e))),
                },
                Poll::Ready(Ok(_)) => continue,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn body_reader(input: &'static [u8], decoder: BodyDecoder) -> BodyReader<&'static [u8]> {
        BodyReader::new(PushbackReader::new(input), decoder)
    }

    #[tokio::test]
    async fn fixed_length_body() {
        let mut body = body_reader(b"hello world", BodyDecoder::fix_length(5));

        let mut out = Vec::new();
        body.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");
        assert!(body.is_eof());
    }

    #[tokio::test]
    async fn empty_body_is_eof_immediately_and_stays_there() {
        let mut body = body_reader(b"", BodyDecoder::empty());

        let mut buf = [0u8; 8];
        assert_eq!(body.read(&mut buf).await.unwrap(), 0);
        assert_eq!(body.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn chunked_body_decodes_to_payload() {
        let mut body = body_reader(b"5\r\nhello\r\n0\r\n\r\n", BodyDecoder::chunked());

        let mut out = Vec::new();
        body.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");

        let mut buf = [0u8; 8];
        assert_eq!(body.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn surplus_bytes_are_pushed_back_for_the_next_message() {
        let mut body = body_reader(b"helloHTTP/1.1 200 OK\r\n", BodyDecoder::fix_length(5));

        let mut out = Vec::new();
        body.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");

        let mut rest = Vec::new();
        body.into_inner().read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, b"HTTP/1.1 200 OK\r\n");
    }

    #[tokio::test]
    async fn chunked_trailer_surplus_is_pushed_back() {
        let mut body = body_reader(b"5\r\nhello\r\n0\r\n\r\nNEXT", BodyDecoder::chunked());

        let mut out = Vec::new();
        body.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");

        let mut rest = Vec::new();
        body.into_inner().read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, b"NEXT");
    }

    #[tokio::test]
    async fn until_close_body_runs_to_transport_eof() {
        let mut body = body_reader(b"everything until the end", BodyDecoder::until_close());

        let mut out = Vec::new();
        body.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"everything until the end");
    }

    #[tokio::test]
    async fn truncated_fixed_length_body_is_an_error() {
        let mut body = body_reader(b"abc", BodyDecoder::fix_length(10));

        let mut out = Vec::new();
        let err = body.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn malformed_chunk_is_an_error() {
        let mut body = body_reader(b"xyz\r\ndata", BodyDecoder::chunked());

        let mut out = Vec::new();
        let err = body.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
