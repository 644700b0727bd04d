//! Response types shared by the client and server halves.
//!
//! A [`ResponseHead`] is the status line plus header block; [`Response`]
//! pairs it with a body. On the client the body is a streaming
//! [`BodyReader`](crate::client::BodyReader); on the server it is any
//! [`http_body::Body`] the handler chooses to return.

use http::{StatusCode, Version};

use crate::protocol::Headers;

/// The status line and header block of a response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    status: StatusCode,
    reason: Option<String>,
    version: Version,
    headers: Headers,
}

impl ResponseHead {
    pub fn new(status: StatusCode) -> Self {
        Self { status, reason: None, version: Version::HTTP_11, headers: Headers::new() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// The status message: the wire reason phrase when one was present,
    /// otherwise the canonical mapping for the status code.
    pub fn reason(&self) -> &str {
        match &self.reason {
            Some(reason) => reason,
            None => self.status.canonical_reason().unwrap_or(""),
        }
    }

    /// Records a non-canonical reason phrase from the wire.
    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = Some(reason.into());
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

    /// Attaches a body, turning the head into a full [`Response`].
    pub fn body<B>(self, body: B) -> Response<B> {
        Response { head: self, body }
    }
}

/// A response: head plus body.
pub struct Response<B> {
    head: ResponseHead,
    body: B,
}

impl<B> Response<B> {
    pub fn new(head: ResponseHead, body: B) -> Self {
        Self { head, body }
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    pub fn status(&self) -> StatusCode {
        self.head.status()
    }

    pub fn headers(&self) -> &Headers {
        self.head.headers()
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }

    pub fn into_parts(self) -> (ResponseHead, B) {
        (self.head, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_falls_back_to_canonical() {
        let head = ResponseHead::new(StatusCode::CREATED);
        assert_eq!(head.reason(), "Created");

        let mut head = ResponseHead::new(StatusCode::CREATED);
        head.set_reason("Made It");
        assert_eq!(head.reason(), "Made It");
    }
}
