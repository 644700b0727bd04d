mod message;
pub use message::BodyFraming;
pub use message::BodyItem;
pub use message::Message;

mod headers;
pub use headers::Headers;

mod target;
pub use target::escape;
pub use target::EscapeMode;
pub use target::Target;

mod request;
pub use request::Request;
pub use request::RequestHead;
pub use request::RequestHeader;
pub use request::ServerRequest;

mod response;
pub use response::Response;
pub use response::ResponseHead;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
pub use error::WsError;

pub mod body;
