//! Codecs for encoding and decoding HTTP messages.
//!
//! Everything here is a `tokio_util` [`Decoder`](tokio_util::codec::Decoder)
//! or [`Encoder`](tokio_util::codec::Encoder) over `BytesMut`, composed in
//! two layers:
//!
//! - [`header`]: start lines and header blocks, both directions.
//! - [`body`]: body framing (content-length, chunked, read-until-close).
//! - [`RequestDecoder`] / [`ResponseEncoder`]: message-level codecs gluing
//!   the two phases together for the server connection loop.
//!
//! The client side composes the header codecs with
//! [`BodyDecoder`](body::BodyDecoder) directly, because its body phase runs
//! over a pushback reader instead of a `FramedRead` (see [`crate::client`]).

pub mod body;
pub mod header;
mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
