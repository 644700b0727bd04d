//! Server-side connection handling.
//!
//! [`HttpConnection`] reads requests off a transport with the
//! [`RequestDecoder`](crate::codec::RequestDecoder), streams each request
//! body to the handler while it runs, and writes the handler's response back
//! through the [`ResponseEncoder`](crate::codec::ResponseEncoder). Keep-alive
//! and the expect-continue mechanism are handled here.

mod http_connection;

pub use http_connection::HttpConnection;
