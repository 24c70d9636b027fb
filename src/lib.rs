//! An HTTP/1.1 server built directly on byte streams.
//!
//! - [`http`]: header store, incremental request parser, buffered request
//!   reader and response writer (fixed-length and chunked with trailers)
//! - [`net`]: per-connection request/response loop and TCP accept loop
//! - [`handler`]: the handler capability invoked per request, plus the demo
//!   [`Router`](handler::Router)
//! - [`config`]: server settings loaded from TOML

pub mod config;
pub mod handler;
pub mod http;
pub mod net;

#[cfg(test)]
mod test_util;
