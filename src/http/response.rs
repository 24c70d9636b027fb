//! Response serialization.
//!
//! [`ResponseWriter`] writes straight to the connection and only tracks
//! where in the message it is, so that the status line, header block, body
//! and trailers go out in that order. The body is either fixed-length (raw
//! bytes, the caller sets `Content-Length`) or chunked (the caller sets
//! `Transfer-Encoding: chunked` and optionally a `Trailer` header). The two
//! modes cannot be mixed within one response.

use std::io;

use async_std::io::{Read, Write, WriteExt};
use thiserror::Error;

use crate::http::CRLF;
use crate::http::headers::Headers;
use crate::http::status::HttpStatus;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("i/o error while writing response: {0}")]
    Io(#[from] io::Error),

    #[error("cannot write {attempted} while the response expects {expected}")]
    OutOfOrder {
        expected: &'static str,
        attempted: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    StatusLine,
    Headers,
    Body,
    FixedBody,
    ChunkedBody,
    Done,
}

impl Stage {
    fn describe(self) -> &'static str {
        match self {
            Stage::StatusLine => "the status line",
            Stage::Headers => "headers",
            Stage::Body => "a body",
            Stage::FixedBody => "more fixed-length body",
            Stage::ChunkedBody => "more chunks",
            Stage::Done => "nothing",
        }
    }
}

pub struct ResponseWriter<'a> {
    out: &'a mut (dyn Write + Unpin + Send + 'a),
    stage: Stage,
}

impl<'a> ResponseWriter<'a> {
    pub fn new(out: &'a mut (dyn Write + Unpin + Send + 'a)) -> Self {
        Self {
            out,
            stage: Stage::StatusLine,
        }
    }

    /// Whether anything has been written yet.
    pub fn is_untouched(&self) -> bool {
        self.stage == Stage::StatusLine
    }

    fn advance(&mut self, allowed: &[Stage], attempted: &'static str) -> Result<(), WriterError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(WriterError::OutOfOrder {
                expected: self.stage.describe(),
                attempted,
            })
        }
    }

    /// `HTTP/1.1 <code> <reason>\r\n`
    pub async fn write_status_line(&mut self, status: HttpStatus) -> Result<(), WriterError> {
        self.advance(&[Stage::StatusLine], "a status line")?;

        let line = format!("HTTP/1.1 {} {}\r\n", status.code(), status.reason());
        self.out.write_all(line.as_bytes()).await?;
        self.stage = Stage::Headers;
        Ok(())
    }

    /// Writes each field as `name:value\r\n`, then the blank line.
    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), WriterError> {
        self.advance(&[Stage::Headers], "headers")?;

        self.out.write_all(&serialize_fields(headers)).await?;
        self.stage = Stage::Body;
        Ok(())
    }

    /// Writes raw fixed-length body bytes.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, WriterError> {
        self.advance(&[Stage::Body, Stage::FixedBody], "a fixed-length body")?;

        self.out.write_all(body).await?;
        self.stage = Stage::FixedBody;
        Ok(body.len())
    }

    /// Copies `source` to the connection until it is exhausted, as
    /// fixed-length body bytes. Returns the number of bytes copied.
    pub async fn write_body_from<R>(&mut self, mut source: R) -> Result<u64, WriterError>
    where
        R: Read + Unpin,
    {
        self.advance(&[Stage::Body, Stage::FixedBody], "a fixed-length body")?;

        let n = async_std::io::copy(&mut source, &mut *self.out).await?;
        self.stage = Stage::FixedBody;
        Ok(n)
    }

    /// Writes one `<hex-len>\r\n<data>\r\n` chunk. Empty data is skipped so
    /// it cannot be mistaken for the terminating chunk.
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<usize, WriterError> {
        self.advance(&[Stage::Body, Stage::ChunkedBody], "a chunk")?;
        self.stage = Stage::ChunkedBody;

        if data.is_empty() {
            return Ok(0);
        }

        let mut frame = Vec::with_capacity(data.len() + 12);
        frame.extend_from_slice(format!("{:x}\r\n", data.len()).as_bytes());
        frame.extend_from_slice(data);
        frame.extend_from_slice(CRLF);
        self.out.write_all(&frame).await?;
        Ok(data.len())
    }

    /// Ends a chunked body with the zero-length chunk, followed by the
    /// trailer fields (if any) and the closing blank line.
    ///
    /// Trailers sit between `0\r\n` and the single final CRLF, so the output
    /// is `0\r\n<fields>\r\n` rather than `0\r\n\r\n` followed by a second
    /// field block.
    pub async fn write_chunked_body_done(
        &mut self,
        trailers: Option<&Headers>,
    ) -> Result<(), WriterError> {
        self.advance(&[Stage::Body, Stage::ChunkedBody], "the last chunk")?;

        let mut tail = b"0\r\n".to_vec();
        match trailers {
            Some(trailers) => tail.extend_from_slice(&serialize_fields(trailers)),
            None => tail.extend_from_slice(CRLF),
        }
        self.out.write_all(&tail).await?;
        self.stage = Stage::Done;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), WriterError> {
        self.out.flush().await?;
        Ok(())
    }
}

fn serialize_fields(headers: &Headers) -> Vec<u8> {
    let mut out = Vec::new();
    headers.for_each(|name, value| {
        out.extend_from_slice(name.as_bytes());
        out.push(b':');
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(CRLF);
    });
    out.extend_from_slice(CRLF);
    out
}

/// `Content-Length` and `Content-Type: text/html`, the baseline every
/// response starts from.
pub fn default_headers(content_length: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("Content-Length", &content_length.to_string());
    headers.set("Content-Type", "text/html");
    headers
}
