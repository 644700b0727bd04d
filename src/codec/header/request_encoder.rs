//! Encoder for request start lines and header blocks (client side).

use crate::protocol::{RequestHead, SendError};

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Writes `METHOD SP request-target SP HTTP/1.1 CRLF`, the header lines
/// exactly as stored (names, order and case preserved), and the terminating
/// empty line.
///
/// No headers are synthesized here: `Host` and body framing are the caller's
/// responsibility (see
/// [`RequestHead::ensure_host`](crate::protocol::RequestHead::ensure_host)).
pub struct RequestHeaderEncoder;

impl Encoder<&RequestHead> for RequestHeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, head: &RequestHead, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEADER_SIZE);

        dst.put_slice(head.method().as_str().as_bytes());
        dst.put_slice(b" ");
        dst.put_slice(head.target().to_string().as_bytes());
        dst.put_slice(b" HTTP/1.1\r\n");

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
