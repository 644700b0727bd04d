//! Request types for both directions of the wire.
//!
//! [`RequestHead`] and [`Request`] are the client-side representation used by
//! the serializer: a method, a [`Target`] and verbatim headers, optionally
//! with a streamed body producer. [`RequestHeader`] and [`ServerRequest`] are
//! the server-side twins produced by the request decoder.

use bytes::Bytes;
use http::{Method, Version};
use http_body_util::Empty;

use crate::ensure;
use crate::protocol::{Headers, SendError, Target};

/// The head of an outgoing request: start line plus header block.
#[derive(Debug, Clone)]
pub struct RequestHead {
    method: Method,
    target: Target,
    headers: Headers,
}

impl RequestHead {
    pub fn new(method: Method, target: Target) -> Self {
        Self { method, target, headers: Headers::new() }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Appends a header, builder style.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Adds a `Host: host:port` header (default port 80) when none is present.
    ///
    /// The serializer itself never synthesizes `Host`; callers that connect
    /// somewhere run this first. A target without a host cannot be sent.
    pub fn ensure_host(&mut self) -> Result<(), SendError> {
        if self.headers.contains("Host") {
            return Ok(());
        }
        ensure!(!self.target.host.is_empty(), SendError::invalid_request("connection host is empty"));

        let host = format!("{}:{}", self.target.host, self.target.port_or_default());
        self.headers.append("Host", host);
        Ok(())
    }

    /// Attaches a streamed body producer, turning the head into a full request.
    pub fn body<B>(self, body: B) -> Request<B> {
        Request { head: self, body: Some(body) }
    }

    /// Turns the head into a request without a body.
    pub fn no_body(self) -> Request<Empty<Bytes>> {
        Request { head: self, body: None }
    }
}

/// A request ready to be serialized: a head plus an optional body producer.
///
/// The body producer is any [`http_body::Body`]; it is driven to end-of-stream
/// by the serializer and written verbatim after the header block.
pub struct Request<B> {
    head: RequestHead,
    body: Option<B>,
}

impl<B> Request<B> {
    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn head_mut(&mut self) -> &mut RequestHead {
        &mut self.head
    }

    pub fn into_parts(self) -> (RequestHead, Option<B>) {
        (self.head, self.body)
    }
}

/// The head of a request received by a server.
#[derive(Debug)]
pub struct RequestHeader {
    method: Method,
    target: String,
    version: Version,
    headers: Headers,
}

impl RequestHeader {
    pub fn new(method: Method, target: String, version: Version, headers: Headers) -> Self {
        Self { method, target, version, headers }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw request-target as it appeared on the wire.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The path portion of the request-target.
    pub fn path(&self) -> &str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => &self.target,
        }
    }

    /// The query portion of the request-target, if any.
    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Determines if this request may carry a body based on its method.
    pub fn need_body(&self) -> bool {
        !matches!(
            self.method,
            Method::GET | Method::HEAD | Method::DELETE | Method::OPTIONS | Method::CONNECT
        )
    }

    /// Attaches a body to this header, producing a full [`ServerRequest`].
    pub fn body<T>(self, body: T) -> ServerRequest<T> {
        ServerRequest { head: self, body }
    }
}

/// A request delivered to a server-side handler: head plus streaming body.
#[derive(Debug)]
pub struct ServerRequest<T> {
    head: RequestHeader,
    body: T,
}

impl<T> ServerRequest<T> {
    pub fn head(&self) -> &RequestHeader {
        &self.head
    }

    pub fn headers(&self) -> &Headers {
        self.head.headers()
    }

    pub fn body_mut(&mut self) -> &mut T {
        &mut self.body
    }

    pub fn into_body(self) -> T {
        self.body
    }

    pub fn into_parts(self) -> (RequestHeader, T) {
        (self.head, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_host_appends_default_port() {
        let target = Target { host: "example.com".into(), path: "/".into(), ..Default::default() };
        let mut head = RequestHead::new(Method::GET, target);

        head.ensure_host().unwrap();
        assert_eq!(head.headers().get("Host"), Some("example.com:80"));
    }

    #[test]
    fn ensure_host_keeps_explicit_header() {
        let target = Target { host: "example.com".into(), port: Some(8080), ..Default::default() };
        let mut head = RequestHead::new(Method::GET, target).header("Host", "other:99");

        head.ensure_host().unwrap();
        assert_eq!(head.headers().get("Host"), Some("other:99"));
        assert_eq!(head.headers().len(), 1);
    }

    #[test]
    fn ensure_host_rejects_empty_host() {
        let mut head = RequestHead::new(Method::GET, Target::path("/file"));
        assert!(head.ensure_host().is_err());
    }

    #[test]
    fn request_header_splits_target() {
        let header = RequestHeader::new(
            Method::GET,
            "/index/?a=1&b=2".to_string(),
            Version::HTTP_11,
            Headers::new(),
        );

        assert_eq!(header.path(), "/index/");
        assert_eq!(header.query(), Some("a=1&b=2"));
        assert!(!header.need_body());
    }
}
