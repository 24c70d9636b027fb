//! Syntax rules shared by the request parser and the header store.
//!
//! These checks are purely lexical: a method is any run of upper-case ASCII
//! letters, the version must be exactly [`HTTP_VERSION`], and header names
//! must be RFC 7230 tokens. The only semantic check is
//! [`Validator::body_length`], which decides how a request body is framed
//! once its header block is complete.

use crate::http::HTTP_VERSION;
use crate::http::headers::Headers;
use crate::http::parser::ParserError;

pub struct Validator;

impl Validator {
    pub fn validate_method(method: &str) -> Result<(), ParserError> {
        if !method.is_empty() && method.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(())
        } else {
            Err(ParserError::InvalidMethod(method.to_string()))
        }
    }

    /// Checks a `NAME/VERSION` protocol field and returns the version part.
    pub fn validate_http_version(protocol: &str) -> Result<&str, ParserError> {
        let mut parts = protocol.split('/');
        let (Some(_), Some(version), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParserError::MalformedHttpVersion(protocol.to_string()));
        };

        if version != HTTP_VERSION {
            return Err(ParserError::InvalidHttpVersion(version.to_string()));
        }

        Ok(version)
    }

    /// Number of body bytes the request carries, decided once its headers
    /// are complete.
    ///
    /// `Content-Length` is read permissively: absent or unparsable means no
    /// body. Chunked framing is refused outright.
    pub fn body_length(headers: &Headers) -> Result<usize, ParserError> {
        let chunked = headers
            .get("transfer-encoding")
            .split(',')
            .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
        if chunked {
            return Err(ParserError::UnsupportedChunkedRequestBody);
        }

        Ok(content_length(headers))
    }
}

pub fn content_length(headers: &Headers) -> usize {
    headers.get("content-length").parse().unwrap_or(0)
}

/// Whether `name` is a non-empty RFC 7230 token.
pub fn is_token(name: &[u8]) -> bool {
    !name.is_empty() && name.iter().all(|&b| is_token_char(b))
}

fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}
