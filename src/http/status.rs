use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpStatus(pub u16);

impl HttpStatus {
    pub const OK: HttpStatus = HttpStatus(200);

    pub const BAD_REQUEST: HttpStatus = HttpStatus(400);
    pub const FORBIDDEN: HttpStatus = HttpStatus(403);
    pub const NOT_FOUND: HttpStatus = HttpStatus(404);
    pub const PAYLOAD_TOO_LARGE: HttpStatus = HttpStatus(413);

    pub const INTERNAL_SERVER_ERROR: HttpStatus = HttpStatus(500);

    pub fn code(self) -> u16 {
        self.0
    }

    /// Reason phrase for the status line; empty for codes not in the table.
    pub fn reason(self) -> &'static str {
        match self.0 {
            200 => "OK",

            400 => "Bad Request",
            403 => "Forbidden",
            404 => "Not Found",
            413 => "Payload Too Large",

            500 => "Internal Server Error",
            _ => "",
        }
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
