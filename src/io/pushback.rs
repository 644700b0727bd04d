//! A reader that can take bytes back.
//!
//! HTTP parsing consumes the stream in chunks, and the chunk that completes a
//! header block usually carries the first body bytes with it. The parser
//! returns those surplus bytes to the [`PushbackReader`]; whoever reads next
//! sees them before anything new from the transport.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, ReadBuf};

/// Wraps an [`AsyncRead`] with a synchronous, infallible `unread` operation.
///
/// Pushed-back bytes are buffered in a single internal tail and drained before
/// the inner reader is touched again. Consecutive `unread` calls concatenate:
/// after `unread(s1); unread(s2)` the next reads yield `s1 ++ s2`.
#[derive(Debug)]
pub struct PushbackReader<R> {
    inner: R,
    buffer: BytesMut,
}

impl<R> PushbackReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, buffer: BytesMut::new() }
    }

    /// Pre-sizes the pushback buffer so typical unreads do not allocate.
    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        Self { inner, buffer: BytesMut::with_capacity(capacity) }
    }

    /// Returns `bytes` to the front of the stream. Never fails.
    pub fn unread(&mut self, bytes: &[u8]) {
        if !bytes.is_empty() {
            self.buffer.extend_from_slice(bytes);
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> AsyncRead for PushbackReader<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if !this.buffer.is_empty() {
            let n = std::cmp::min(this.buffer.len(), buf.remaining());
            buf.put_slice(&this.buffer[..n]);
            this.buffer.advance(n);
            return Poll::Ready(Ok(()));
        }

        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn reads_pass_through_without_pushback() {
        let mut reader = PushbackReader::new(&b"hello"[..]);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello");
    }

    #[tokio::test]
    async fn unread_bytes_come_back_first() {
        let mut reader = PushbackReader::new(&b" world"[..]);
        reader.unread(b"hello");

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello world");
    }

    #[tokio::test]
    async fn consecutive_unreads_concatenate() {
        let mut reader = PushbackReader::new(&b""[..]);
        reader.unread(b"s1");
        reader.unread(b"s2");
        reader.unread(b"s3");

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"s1s2s3");
    }

    #[tokio::test]
    async fn unread_interleaves_with_reads() {
        let mut reader = PushbackReader::new(&b"cdef"[..]);

        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"cd");

        reader.unread(b"ab");
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ab");

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"ef");
    }

    #[tokio::test]
    async fn short_destination_drains_pushback_incrementally() {
        let mut reader = PushbackReader::new(&b""[..]);
        reader.unread(b"abcd");

        let mut buf = [0u8; 3];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"abc");

        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"d");
    }
}
