//! Error types for the HTTP and WebSocket cores.
//!
//! The hierarchy mirrors the two directions of the wire:
//!
//! - [`ParseError`]: inbound bytes were malformed or ended early. Every
//!   protocol-level variant maps to HTTP status 400.
//! - [`SendError`]: an outbound message could not be produced.
//! - [`HttpError`]: the top-level error of the client and connection
//!   operations, including cancellation of the owning context.
//! - [`WsError`]: WebSocket frame and connection errors.
//!
//! None of the cores retry; every error here is fatal for its connection.

use http::StatusCode;
use std::io;
use thiserror::Error;

/// The top-level error type for HTTP operations.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Errors while receiving and parsing a message
    #[error("receive error: {source}")]
    Receive {
        #[from]
        source: ParseError,
    },

    /// Errors while producing and sending a message
    #[error("send error: {source}")]
    Send {
        #[from]
        source: SendError,
    },

    /// The owning context was closed while the operation was in flight
    #[error("async operation cancelled")]
    Cancelled,
}

/// Errors raised while parsing an inbound HTTP message.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Header block exceeds the maximum allowed size
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    /// Number of headers exceeds the maximum allowed
    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    /// Invalid start line or header format
    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    /// Unsupported HTTP version
    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    /// Invalid or missing HTTP method
    #[error("invalid http method")]
    InvalidMethod,

    /// Invalid or missing request target
    #[error("invalid request target")]
    InvalidTarget,

    /// Invalid or missing status code
    #[error("invalid status code")]
    InvalidStatus,

    /// Invalid Content-Length header
    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    /// Invalid message body framing
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    /// The stream ended in the middle of a message
    #[error("incomplete message: {reason}")]
    IncompleteMessage { reason: String },

    /// I/O error while reading the message
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    /// Creates a new TooLargeHeader error
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    /// Creates a new TooManyHeaders error
    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    /// Creates a new InvalidHeader error
    pub fn invalid_header<S: ToString>(reason: S) -> Self {
        Self::InvalidHeader { reason: reason.to_string() }
    }

    /// Creates a new InvalidBody error
    pub fn invalid_body<S: ToString>(reason: S) -> Self {
        Self::InvalidBody { reason: reason.to_string() }
    }

    /// Creates a new InvalidContentLength error
    pub fn invalid_content_length<S: ToString>(reason: S) -> Self {
        Self::InvalidContentLength { reason: reason.to_string() }
    }

    /// Creates a new IncompleteMessage error
    pub fn incomplete_message<S: ToString>(reason: S) -> Self {
        Self::IncompleteMessage { reason: reason.to_string() }
    }

    /// Creates a new I/O error
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The HTTP status this error is reported as.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// Errors raised while producing an outbound HTTP message.
#[derive(Error, Debug)]
pub enum SendError {
    /// The message body does not match its declared framing
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    /// The request cannot be sent as constructed
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// I/O error while writing the message
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    /// Creates a new InvalidBody error
    pub fn invalid_body<S: ToString>(reason: S) -> Self {
        Self::InvalidBody { reason: reason.to_string() }
    }

    /// Creates a new InvalidRequest error
    pub fn invalid_request<S: ToString>(reason: S) -> Self {
        Self::InvalidRequest { reason: reason.to_string() }
    }

    /// Creates a new I/O error
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Errors raised by the WebSocket frame codec and connection controller.
#[derive(Error, Debug)]
pub enum WsError {
    /// The input span ends before the frame does
    #[error("frame too short")]
    FrameTooShort,

    /// The frame carries an opcode outside RFC 6455
    #[error("unknown websocket opcode: {value:#x}")]
    IllegalOpcode { value: u8 },

    /// The peer did not answer the last keep-alive ping
    #[error("peer failed to respond to ping")]
    PingTimeout,

    /// The connection is closed; no further reads or writes are possible
    #[error("websocket connection closed")]
    Closed,

    /// The owning context was closed
    #[error("async operation cancelled")]
    Cancelled,

    /// I/O error on the underlying transport
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}
