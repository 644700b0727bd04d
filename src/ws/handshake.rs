//! The server half of the WebSocket opening handshake
//! ([RFC 6455 §4](https://datatracker.ietf.org/doc/html/rfc6455#section-4)).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha1::{Digest, Sha1};

/// The GUID every `Sec-WebSocket-Accept` digest is salted with, fixed by
/// RFC 6455.
pub const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Derives the `Sec-WebSocket-Accept` value for a client's
/// `Sec-WebSocket-Key`.
pub fn accept_key(client_key: &str) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(client_key.as_bytes());
    sha1.update(GUID.as_bytes());
    STANDARD.encode(sha1.finalize())
}

/// Renders the complete `101 Switching Protocols` reply for a client key.
///
/// After these bytes are written, the transport belongs to the
/// [`WebSocketController`](crate::ws::WebSocketController).
pub fn make_handshake(client_key: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         \r\n",
        accept_key(client_key)
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_the_rfc6455_sample_key() {
        assert_eq!(accept_key("dGhlIHNhbXBsZSBub25jZQ=="), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn handshake_reply_contains_the_accept_header() {
        let reply = String::from_utf8(make_handshake("dGhlIHNhbXBsZSBub25jZQ==")).unwrap();

        assert!(reply.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(reply.contains("Upgrade: websocket\r\n"));
        assert!(reply.contains("Connection: Upgrade\r\n"));
        assert!(reply.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
        assert!(reply.ends_with("\r\n\r\n"));
    }
}
