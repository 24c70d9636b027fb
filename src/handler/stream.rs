use sha2::{Digest, Sha256};

use crate::handler::responses;
use crate::http::headers::Headers;
use crate::http::response::{ResponseWriter, WriterError};
use crate::http::status::HttpStatus;

const CHUNK_SIZE: usize = 32;
pub const MAX_LINES: usize = 1000;

/// Streams `lines` generated lines as a chunked body, followed by the
/// SHA-256 and length of the whole body as trailers.
pub async fn serve(
    res: &mut ResponseWriter<'_>,
    server_name: &str,
    lines: usize,
) -> Result<(), WriterError> {
    let mut headers = responses::base_headers(server_name, 0);
    headers.remove("Content-Length");
    headers.set("Transfer-Encoding", "chunked");
    headers.replace("Content-Type", "text/plain");
    headers.set("Trailer", "X-Content-SHA256");
    headers.set("Trailer", "X-Content-Length");

    res.write_status_line(HttpStatus::OK).await?;
    res.write_headers(&headers).await?;

    let body = generate(lines.min(MAX_LINES));
    let mut hasher = Sha256::new();
    for chunk in body.chunks(CHUNK_SIZE) {
        hasher.update(chunk);
        res.write_chunk(chunk).await?;
    }

    let mut trailers = Headers::new();
    trailers.set("X-Content-SHA256", &hex::encode(hasher.finalize()));
    trailers.set("X-Content-Length", &body.len().to_string());
    res.write_chunked_body_done(Some(&trailers)).await
}

fn generate(lines: usize) -> Vec<u8> {
    (0..lines)
        .flat_map(|id| format!("{{\"id\": {id}, \"line\": \"stream line {id}\"}}\n").into_bytes())
        .collect()
}
