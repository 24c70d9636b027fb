pub mod headers;
pub mod parser;
pub mod reader;
pub mod request;
pub mod response;
pub mod status;
pub mod validator;

pub use headers::{HeaderError, Headers};
pub use parser::{Parser, ParserError, ParserState};
pub use reader::{Limits, ReadError, RequestReader};
pub use request::{HttpRequest, RequestLine};
pub use response::{ResponseWriter, WriterError, default_headers};
pub use status::HttpStatus;

/// The only protocol version accepted on a request line.
pub const HTTP_VERSION: &str = "1.1";

pub(crate) const CRLF: &[u8] = b"\r\n";

/// Offset of the first `\r\n` in `data`, if any.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == CRLF)
}
