//! WebSocket support (RFC 6455): frame codec, upgrade handshake and the
//! per-connection controller.
//!
//! [`frame`] is pure and freely callable from any thread; the
//! [`WebSocketController`] is the stateful part, one per connection.

pub mod frame;
pub mod handshake;

mod controller;

pub use controller::WebSocketController;
pub use frame::{Frame, Opcode};
pub use handshake::{accept_key, make_handshake};
