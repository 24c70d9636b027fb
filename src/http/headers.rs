//! HTTP header fields for [`HttpRequest`](crate::http::request::HttpRequest)
//! and for responses written through
//! [`ResponseWriter`](crate::http::response::ResponseWriter).
//!
//! Field names are case-insensitive: they are stored lower-cased and every
//! lookup lower-cases its argument first. A name seen more than once keeps a
//! single entry whose value is the arrival-ordered list of values joined by
//! `,` (no space).
//!
//! Entries are kept in an ordered map, so iteration (and therefore the wire
//! order produced by the response writer) follows first insertion.
//!
//! [`Headers::parse`] consumes the header block of a message from a raw byte
//! buffer. It only ever consumes complete CRLF-terminated lines, which lets
//! the caller retry with more bytes when a line is split across reads.

use indexmap::IndexMap;
use thiserror::Error;

use crate::http::find_crlf;
use crate::http::validator::is_token;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("malformed header line: missing ':'")]
    MalformedHeaderLine,

    #[error("malformed header name: {0:?}")]
    MalformedHeaderName(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: IndexMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    /// Case-insensitive lookup. An absent field reads as the empty string.
    pub fn get(&self, name: &str) -> &str {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_ascii_lowercase())
    }

    /// Inserts a field, appending to an existing value with `,`.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.fields.get_mut(&name) {
            Some(existing) => {
                existing.push(',');
                existing.push_str(value);
            }
            None => {
                self.fields.insert(name, value.to_string());
            }
        }
    }

    /// Overwrites a field, discarding anything `set` accumulated before.
    pub fn replace(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        self.fields.shift_remove(&name.to_ascii_lowercase());
    }

    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &str),
    {
        for (name, value) in &self.fields {
            visit(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses CRLF-terminated field lines from the start of `data`.
    ///
    /// Returns the number of bytes consumed and whether the blank line that
    /// ends the header block was reached (its CRLF is included in the count).
    /// A trailing partial line is left unconsumed.
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool), HeaderError> {
        let mut read = 0;

        while let Some(idx) = find_crlf(&data[read..]) {
            if idx == 0 {
                return Ok((read + 2, true));
            }

            let (name, value) = parse_field_line(&data[read..read + idx])?;
            self.set(&name, &value);
            read += idx + 2;
        }

        Ok((read, false))
    }
}

fn parse_field_line(line: &[u8]) -> Result<(String, String), HeaderError> {
    let colon = line
        .iter()
        .position(|&b| b == b':')
        .ok_or(HeaderError::MalformedHeaderLine)?;

    let name = &line[..colon];
    let value = line[colon + 1..].trim_ascii();

    if name.last().is_some_and(u8::is_ascii_whitespace) || !is_token(name) {
        return Err(HeaderError::MalformedHeaderName(
            String::from_utf8_lossy(name).into_owned(),
        ));
    }

    // is_token guarantees the name is ASCII
    let name = String::from_utf8_lossy(name).into_owned();
    let value = String::from_utf8_lossy(value).into_owned();
    Ok((name, value))
}
