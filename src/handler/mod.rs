//! The server-side request handler abstraction.

use crate::protocol::body::ReqBody;
use crate::protocol::{Response, ServerRequest};
use http_body::Body;
use std::error::Error;
use std::future::Future;

/// Handles one request and produces one response.
///
/// The request body streams from the connection while the handler runs; any
/// part the handler leaves unread is drained by the connection afterwards.
pub trait Handler: Send + Sync {
    type RespBody: Body;
    type Error: Into<Box<dyn Error + Send + Sync>>;
    type Fut<'fut>: Future<Output = Result<Response<Self::RespBody>, Self::Error>>
    where
        Self: 'fut;

    fn call(&self, req: ServerRequest<ReqBody>) -> Self::Fut<'_>;
}

/// A [`Handler`] backed by a plain async function.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<RespBody, Err, F, Fut> Handler for HandlerFn<F>
where
    RespBody: Body,
    F: Fn(ServerRequest<ReqBody>) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response<RespBody>, Err>> + Send,
{
    type RespBody = RespBody;
    type Error = Err;
    type Fut<'fut> = Fut where Self: 'fut;

    fn call(&self, req: ServerRequest<ReqBody>) -> Self::Fut<'_> {
        (self.f)(req)
    }
}

pub fn make_handler<F, RespBody, Err, Ret>(f: F) -> HandlerFn<F>
where
    RespBody: Body,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<Response<RespBody>, Err>>,
    F: Fn(ServerRequest<ReqBody>) -> Ret,
{
    HandlerFn { f }
}
