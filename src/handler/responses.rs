use crate::http::headers::Headers;
use crate::http::response::{ResponseWriter, WriterError, default_headers};
use crate::http::status::HttpStatus;

pub fn ok_page() -> &'static [u8] {
    br#"<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was handled.</p>
  </body>
</html>"#
}

pub fn bad_request_page() -> &'static [u8] {
    br#"<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>The request could not be understood.</p>
  </body>
</html>"#
}

pub fn forbidden_page() -> &'static [u8] {
    br#"<html>
  <head>
    <title>403 Forbidden</title>
  </head>
  <body>
    <h1>Forbidden</h1>
  </body>
</html>"#
}

pub fn not_found_page() -> &'static [u8] {
    br#"<html>
  <head>
    <title>404 Not Found</title>
  </head>
  <body>
    <h1>Not Found</h1>
  </body>
</html>"#
}

pub fn internal_server_error_page() -> &'static [u8] {
    br#"<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Something went wrong on our side.</p>
  </body>
</html>"#
}

pub fn page_for(status: HttpStatus) -> &'static [u8] {
    match status {
        HttpStatus::OK => ok_page(),
        HttpStatus::BAD_REQUEST => bad_request_page(),
        HttpStatus::FORBIDDEN => forbidden_page(),
        HttpStatus::NOT_FOUND => not_found_page(),
        _ => internal_server_error_page(),
    }
}

/// Headers every routed response carries on top of [`default_headers`].
pub fn base_headers(server_name: &str, content_length: usize) -> Headers {
    let mut headers = default_headers(content_length);
    headers.set("Server", server_name);
    headers.set("Date", &httpdate::fmt_http_date(std::time::SystemTime::now()));
    headers
}

/// Writes a complete fixed-length HTML response.
pub async fn write_page(
    res: &mut ResponseWriter<'_>,
    server_name: &str,
    status: HttpStatus,
    body: &[u8],
) -> Result<(), WriterError> {
    res.write_status_line(status).await?;
    res.write_headers(&base_headers(server_name, body.len())).await?;
    res.write_body(body).await?;
    Ok(())
}
