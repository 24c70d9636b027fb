//! Request handlers.
//!
//! The connection driver calls a [`Handler`] once per fully parsed request,
//! with a [`ResponseWriter`] bound to the same connection. The handler owns
//! the whole response: status line, headers, body and (for chunked bodies)
//! trailers.

mod responses;
mod router;
mod static_files;
mod stream;

use std::future::Future;
use std::pin::Pin;

use crate::http::request::HttpRequest;
use crate::http::response::{ResponseWriter, WriterError};

pub use router::Router;

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), WriterError>> + Send + 'a>>;

pub trait Handler: Send + Sync + 'static {
    fn handle<'a, 'w: 'a>(
        &'a self,
        res: &'a mut ResponseWriter<'w>,
        req: &'a HttpRequest,
    ) -> HandlerFuture<'a>;
}
