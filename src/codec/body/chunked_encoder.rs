//! Encoder for chunked transfer encoding
//! ([RFC 7230 §4.1](https://tools.ietf.org/html/rfc7230#section-4.1)).

use crate::protocol::{BodyItem, SendError};
use bytes::{Buf, BytesMut};
use std::io::Write;
use tokio_util::codec::Encoder;

/// An encoder producing chunked transfer encoding.
///
/// Every data item becomes one chunk (`SIZE\r\ndata\r\n`); the end marker
/// becomes the terminal zero-length chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedEncoder {
    /// Whether the final zero-length chunk has been written
    eof: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false }
    }

    /// Returns whether the terminal chunk has been written.
    pub fn is_finished(&self) -> bool {
        self.eof
    }
}

impl Default for ChunkedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Buf> Encoder<BodyItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: BodyItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            BodyItem::Data(bytes) => {
                write!(helper::Writer(dst), "{:X}\r\n", bytes.remaining())?;
                dst.reserve(bytes.remaining() + 2);
                dst.extend_from_slice(bytes.chunk());
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            BodyItem::End => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
                Ok(())
            }
        }
    }
}

/// Adapter so `write!` can print the hex chunk size straight into a `BytesMut`.
mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
