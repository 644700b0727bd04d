//! Streaming request bodies for the server side.
//!
//! The connection hands a [`ReqBody`] to the request handler and keeps the
//! matching [`BodySender`]. The handler pulls body data on demand through a
//! signal/data channel pair; once it returns, the connection drains whatever
//! the handler left unread so the next request on the connection starts at a
//! clean message boundary.

mod body_channel;
mod req_body;

pub(crate) use body_channel::BodySender;
pub use req_body::ReqBody;
