//! Body framing codecs: content-length, chunked and read-until-close.

mod body_decoder;
mod body_encoder;
mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod length_encoder;

pub use body_decoder::BodyDecoder;
pub use body_encoder::BodyEncoder;
pub use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkedEncoder;
pub use length_decoder::LengthDecoder;
pub use length_encoder::LengthEncoder;
