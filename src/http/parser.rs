//! Incremental request parser.
//!
//! [`Parser::feed`] is handed the unconsumed bytes of the connection and
//! returns how many of them it used. Unused bytes belong to the caller, which
//! keeps them and calls `feed` again once more data has arrived. The parser
//! itself never buffers: a request line or header line is only consumed once
//! its CRLF is visible, and body bytes are moved straight into the request.

use thiserror::Error;

use crate::http::find_crlf;
use crate::http::headers::HeaderError;
use crate::http::request::{HttpRequest, RequestLine};
use crate::http::status::HttpStatus;
use crate::http::validator::Validator;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("malformed request line: expected 3 fields, got {0}")]
    MalformedRequestLine(usize),

    #[error("invalid http method: {0:?}")]
    InvalidMethod(String),

    #[error("malformed http version: {0:?}")]
    MalformedHttpVersion(String),

    #[error("invalid http version: {0:?}")]
    InvalidHttpVersion(String),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("chunked request bodies are not supported")]
    UnsupportedChunkedRequestBody,

    #[error("entered body state without a content length")]
    EmptyBodyRequirement,
}

impl ParserError {
    pub fn into_http_status(self) -> HttpStatus {
        HttpStatus::BAD_REQUEST
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParserState {
    Init,
    ParsingHeaders,
    ParsingBody,
    Done,
}

#[derive(Debug)]
pub struct Parser {
    state: ParserState,
    body_length: usize,
    head_length: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Init,
            body_length: 0,
            head_length: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Body length the request declared, known once headers are complete.
    pub fn body_length(&self) -> usize {
        self.body_length
    }

    /// Bytes consumed so far by the request line and header block.
    pub fn head_length(&self) -> usize {
        self.head_length
    }

    /// Advances through as many states as `buf` allows.
    ///
    /// Returns the number of bytes consumed from the front of `buf`. Returns
    /// early with fewer bytes when the next line is incomplete, when the body
    /// is still short, or once the request is done; trailing bytes after a
    /// complete request are never touched.
    pub fn feed(&mut self, buf: &[u8], req: &mut HttpRequest) -> Result<usize, ParserError> {
        let mut read = 0;

        while read < buf.len() {
            let data = &buf[read..];
            let n = match self.state {
                ParserState::Init => self.parse_request_line(data, req)?,
                ParserState::ParsingHeaders => self.parse_headers(data, req)?,
                ParserState::ParsingBody => self.parse_body(data, req)?,
                ParserState::Done => 0,
            };

            if n == 0 {
                break;
            }
            read += n;
        }

        Ok(read)
    }

    fn parse_request_line(
        &mut self,
        data: &[u8],
        req: &mut HttpRequest,
    ) -> Result<usize, ParserError> {
        let Some(end) = find_crlf(data) else {
            return Ok(0);
        };

        let line = String::from_utf8_lossy(&data[..end]);
        let parts: Vec<&str> = line.split(' ').collect();
        let [method, target, protocol] = parts.as_slice() else {
            return Err(ParserError::MalformedRequestLine(parts.len()));
        };

        Validator::validate_method(method)?;
        let version = Validator::validate_http_version(protocol)?;

        req.request_line = RequestLine {
            method: method.to_string(),
            target: target.to_string(),
            http_version: version.to_string(),
        };

        self.state = ParserState::ParsingHeaders;
        self.head_length += end + 2;
        Ok(end + 2)
    }

    fn parse_headers(&mut self, data: &[u8], req: &mut HttpRequest) -> Result<usize, ParserError> {
        let (n, complete) = req.headers.parse(data)?;
        self.head_length += n;

        if complete {
            self.body_length = Validator::body_length(&req.headers)?;
            self.state = if self.body_length > 0 {
                ParserState::ParsingBody
            } else {
                ParserState::Done
            };
        }

        Ok(n)
    }

    fn parse_body(&mut self, data: &[u8], req: &mut HttpRequest) -> Result<usize, ParserError> {
        if self.body_length == 0 {
            return Err(ParserError::EmptyBodyRequirement);
        }

        let remaining = self.body_length.saturating_sub(req.body.len());
        let n = remaining.min(data.len());
        req.body.extend_from_slice(&data[..n]);

        if req.body.len() == self.body_length {
            self.state = ParserState::Done;
        }

        Ok(n)
    }
}
