use bytes::{Buf, Bytes};

/// A decoded or to-be-encoded piece of an HTTP message: either the head
/// (start line plus header block) or one item of the body stream.
///
/// The generic parameter `H` is the head type (a request or response head,
/// usually paired with its [`BodyFraming`]), while `D` is the body chunk type.
pub enum Message<H, D: Buf = Bytes> {
    /// The start line and header block
    Head(H),
    /// A piece of the body stream
    Body(BodyItem<D>),
}

/// One item of a body stream: a chunk of data, or the end of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem<D: Buf = Bytes> {
    /// A chunk of body data
    Data(D),
    /// Marks the end of the body
    End,
}

/// How a message body is delimited on the wire.
///
/// `UntilClose` only occurs on responses: a response with neither
/// `Content-Length` nor `Transfer-Encoding: chunked` runs until the peer
/// closes the connection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyFraming {
    /// No body at all
    Empty,
    /// Body length declared by `Content-Length`
    Length(u64),
    /// Chunked transfer encoding
    Chunked,
    /// Body delimited by the end of the connection
    UntilClose,
}

impl BodyFraming {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, BodyFraming::Empty)
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, BodyFraming::Chunked)
    }

    #[inline]
    pub fn is_until_close(&self) -> bool {
        matches!(self, BodyFraming::UntilClose)
    }
}

impl<H, D: Buf> Message<H, D> {
    #[inline]
    pub fn is_head(&self) -> bool {
        matches!(self, Message::Head(_))
    }

    #[inline]
    pub fn is_body(&self) -> bool {
        matches!(self, Message::Body(_))
    }

    /// Converts the message into its body item, or `None` for a head.
    pub fn into_body_item(self) -> Option<BodyItem<D>> {
        match self {
            Message::Head(_) => None,
            Message::Body(item) => Some(item),
        }
    }
}

impl<H> From<Bytes> for Message<H> {
    fn from(bytes: Bytes) -> Self {
        Self::Body(BodyItem::Data(bytes))
    }
}

impl<D: Buf> BodyItem<D> {
    #[inline]
    pub fn is_end(&self) -> bool {
        matches!(self, BodyItem::End)
    }

    #[inline]
    pub fn is_data(&self) -> bool {
        matches!(self, BodyItem::Data(_))
    }

    /// Returns a reference to the chunk data, or `None` for the end marker.
    pub fn as_data(&self) -> Option<&D> {
        match self {
            BodyItem::Data(data) => Some(data),
            BodyItem::End => None,
        }
    }

    /// Consumes the item and returns the chunk data, or `None` for the end marker.
    pub fn into_data(self) -> Option<D> {
        match self {
            BodyItem::Data(data) => Some(data),
            BodyItem::End => None,
        }
    }
}
