//! HTTP/1.1 and WebSocket wire-protocol core.
//!
//! This crate turns a bidirectional byte stream into structured HTTP messages
//! and WebSocket frames, and back again. It contains no transport: everything
//! operates on `AsyncRead`/`AsyncWrite` pairs supplied by the caller.
//!
//! # Components
//!
//! - [`io::PushbackReader`]: a byte source with an `unread` operation, used to
//!   hand bytes that straddle a message boundary back to the stream.
//! - [`codec`]: `tokio_util` decoders and encoders for start lines, header
//!   blocks and body framing (content-length, chunked, read-until-close).
//! - [`client`]: request serialization and response receiving with a lazily
//!   streamed body.
//! - [`connection`] and [`handler`]: the server-side connection loop built on
//!   the same codecs.
//! - [`ws`]: RFC 6455 frame codec, upgrade handshake and a per-connection
//!   controller with keep-alive pings and an orderly close handshake.

pub mod client;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod io;
pub mod protocol;
pub mod ws;

pub(crate) use help::ensure;

mod help {

    macro_rules! ensure {
        ($predicate:expr, $error:expr) => {
            if !$predicate {
                return Err($error);
            }
        };
    }
    pub(crate) use ensure;
}
