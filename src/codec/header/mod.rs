//! Start-line and header-block codecs for both directions of the wire.

mod request_decoder;
mod request_encoder;
mod response_decoder;
mod response_encoder;

pub use request_decoder::RequestHeaderDecoder;
pub use request_encoder::RequestHeaderEncoder;
pub use response_decoder::ResponseHeaderDecoder;
pub use response_encoder::ResponseHeaderEncoder;
