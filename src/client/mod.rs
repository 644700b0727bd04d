//! Client-side drivers: request serialization and response receiving.
//!
//! [`send_request`] writes one request to a writer; [`make_request`] then
//! parses the response off a [`PushbackReader`], resolving as soon as the
//! header block is complete with a body that streams on demand.
//!
//! Both operations race the caller's [`CancellationToken`]; closing it fails
//! the returned future with [`HttpError::Cancelled`] and drops any partial
//! state.

mod body_reader;
pub use body_reader::BodyReader;

use std::fmt::Display;

use bytes::{Bytes, BytesMut};
use http_body::Body;
use http_body_util::BodyExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::codec::header::{RequestHeaderEncoder, ResponseHeaderDecoder};
use crate::io::PushbackReader;
use crate::protocol::{HttpError, ParseError, Request, Response, SendError};

const RECEIVE_BUF_SIZE: usize = 4096;

/// Serializes `request` into `writer`: start line, header block, then the
/// body producer copied verbatim to end-of-stream.
///
/// Resolves with the number of bytes written, only after the body producer is
/// exhausted. Header bytes always precede body bytes on the wire.
pub async fn send_request<W, B>(ctx: &CancellationToken, request: Request<B>, writer: &mut W) -> Result<u64, HttpError>
where
    W: AsyncWrite + Unpin,
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(HttpError::Cancelled),
        result = do_send_request(request, writer) => result,
    }
}

/// Sends `request` and receives the response from `reader`.
///
/// The future resolves precisely when the response headers are known; the
/// returned body is opaque and not drained until read. Bytes past the header
/// block that arrived in the same transport read are handed back to the
/// pushback reader and re-surface through the body.
pub async fn make_request<W, R, B>(
    ctx: &CancellationToken,
    request: Request<B>,
    writer: &mut W,
    reader: PushbackReader<R>,
) -> Result<Response<BodyReader<R>>, HttpError>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(HttpError::Cancelled),
        result = async {
            do_send_request(request, writer).await?;
            receive_response(reader).await
        } => result,
    }
}

async fn do_send_request<W, B>(request: Request<B>, writer: &mut W) -> Result<u64, HttpError>
where
    W: AsyncWrite + Unpin,
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    let (head, body) = request.into_parts();

    let mut buf = BytesMut::new();
    RequestHeaderEncoder.encode(&head, &mut buf)?;
    writer.write_all(&buf).await.map_err(SendError::io)?;

    let mut written = buf.len() as u64;
    trace!(method = %head.method(), bytes = written, "request header block sent");

    if let Some(mut body) = body {
        loop {
            match body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        writer.write_all(&data).await.map_err(SendError::io)?;
                        written += data.len() as u64;
                    }
                }
                Some(Err(e)) => {
                    return Err(SendError::invalid_body(format!("request body error: {e}")).into());
                }
                None => break,
            }
        }
    }

    writer.flush().await.map_err(SendError::io)?;
    Ok(written)
}

/// Reads from `reader` in 4 KiB portions until the response head is complete,
/// then transfers the reader and the body decoder into a [`BodyReader`].
async fn receive_response<R>(mut reader: PushbackReader<R>) -> Result<Response<BodyReader<R>>, HttpError>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = ResponseHeaderDecoder;
    let mut buf = BytesMut::with_capacity(RECEIVE_BUF_SIZE);

    loop {
        let n = reader.read_buf(&mut buf).await.map_err(ParseError::io)?;

        if let Some((head, framing)) = decoder.decode(&mut buf).map_err(HttpError::from)? {
            // the tail of the last read belongs to the body
            if !buf.is_empty() {
                reader.unread(&buf);
            }
            let body = BodyReader::new(reader, framing.into());
            return Ok(head.body(body));
        }

        if n == 0 {
            return Err(ParseError::incomplete_message("connection closed before response headers").into());
        }
    }
}
