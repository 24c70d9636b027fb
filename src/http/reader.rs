//! Reads complete requests off a byte stream.
//!
//! [`RequestReader`] owns the connection's read buffer for its whole
//! lifetime. Each read appends to the unconsumed tail, the parser is fed the
//! whole tail, and the consumed prefix is dropped by moving the rest to the
//! front. Bytes that arrive after the end of one request stay in the buffer
//! and start the next one.

use std::io;

use async_std::io::{Read, ReadExt};
use thiserror::Error;
use tracing::trace;

use crate::http::parser::{Parser, ParserError, ParserState};
use crate::http::request::HttpRequest;
use crate::http::status::HttpStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Bytes requested from the stream per read.
    pub read_size: usize,
    /// Largest unconsumed backlog the buffer may grow to.
    pub max_buffer_size: usize,
    /// Largest request line plus header block, counted as it is parsed.
    pub max_header_size: usize,
    pub max_body_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            read_size: 4096,
            max_buffer_size: 64 * 1024,
            max_header_size: 8192,
            max_body_size: 1024 * 1024, // 1 MB
        }
    }
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("i/o error while reading request: {0}")]
    Io(#[from] io::Error),

    /// The peer closed the stream before sending any byte of a new request.
    #[error("connection closed")]
    ConnectionClosed,

    #[error("stream ended before the request was complete")]
    TruncatedStream,

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error("request head exceeds {0} bytes")]
    RequestTooLarge(usize),

    #[error("declared body of {length} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { length: usize, limit: usize },
}

impl ReadError {
    /// Status for the best-effort error response, or `None` when nothing
    /// should be written back.
    pub fn into_http_status(self) -> Option<HttpStatus> {
        match self {
            ReadError::Io(_) | ReadError::ConnectionClosed => None,
            ReadError::Parser(err) => Some(err.into_http_status()),
            ReadError::TruncatedStream | ReadError::RequestTooLarge(_) => {
                Some(HttpStatus::BAD_REQUEST)
            }
            ReadError::PayloadTooLarge { .. } => Some(HttpStatus::PAYLOAD_TOO_LARGE),
        }
    }
}

pub struct RequestReader {
    buf: Vec<u8>,
    len: usize,
    limits: Limits,
}

impl RequestReader {
    pub fn new(limits: Limits) -> Self {
        Self {
            buf: vec![0; limits.read_size.max(1)],
            len: 0,
            limits,
        }
    }

    /// Bytes received but not yet claimed by a request.
    pub fn buffered(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Reads from `stream` until one full request has been parsed.
    pub async fn read_request<S>(&mut self, stream: &mut S) -> Result<HttpRequest, ReadError>
    where
        S: Read + Unpin + ?Sized,
    {
        let mut parser = Parser::new();
        let mut req = HttpRequest::new();

        loop {
            if self.len > 0 {
                let n = parser.feed(&self.buf[..self.len], &mut req)?;
                self.consume(n);

                if parser.head_length() > self.limits.max_header_size {
                    return Err(ReadError::RequestTooLarge(self.limits.max_header_size));
                }
                if parser.body_length() > self.limits.max_body_size {
                    return Err(ReadError::PayloadTooLarge {
                        length: parser.body_length(),
                        limit: self.limits.max_body_size,
                    });
                }

                if parser.is_done() {
                    return Ok(req);
                }
            }

            self.reserve()?;

            let n = match stream.read(&mut self.buf[self.len..]).await {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ReadError::Io(e)),
            };
            trace!(bytes = n, state = ?parser.state(), "read from stream");

            if n == 0 {
                return Err(if parser.state() == ParserState::Init && self.len == 0 {
                    ReadError::ConnectionClosed
                } else {
                    ReadError::TruncatedStream
                });
            }
            self.len += n;
        }
    }

    fn consume(&mut self, n: usize) {
        self.buf.copy_within(n..self.len, 0);
        self.len -= n;
    }

    /// Ensures there is room for at least one more byte.
    fn reserve(&mut self) -> Result<(), ReadError> {
        if self.len < self.buf.len() {
            return Ok(());
        }

        if self.buf.len() >= self.limits.max_buffer_size {
            return Err(ReadError::RequestTooLarge(self.limits.max_buffer_size));
        }

        let grown = (self.buf.len() * 2).min(self.limits.max_buffer_size);
        self.buf.resize(grown, 0);
        Ok(())
    }
}
