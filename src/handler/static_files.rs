use std::io::ErrorKind::*;
use std::path::{Path, PathBuf};

use async_std::fs::File;
use tracing::debug;

use crate::handler::responses;
use crate::http::response::{ResponseWriter, WriterError};
use crate::http::status::HttpStatus;

/// Streams the file at `rel_path` under `root` as a fixed-length body.
pub async fn serve(
    res: &mut ResponseWriter<'_>,
    root: &Path,
    server_name: &str,
    rel_path: &str,
) -> Result<(), WriterError> {
    let Some(full_path) = sanitize_path(root, rel_path) else {
        return respond(res, server_name, HttpStatus::BAD_REQUEST).await;
    };
    debug!(path = %full_path.display(), "serving static file");

    let file = match File::open(&full_path).await {
        Ok(f) => f,
        Err(err) => {
            let status = match err.kind() {
                NotFound => HttpStatus::NOT_FOUND,
                PermissionDenied => HttpStatus::FORBIDDEN,
                _ => HttpStatus::INTERNAL_SERVER_ERROR,
            };
            return respond(res, server_name, status).await;
        }
    };

    let len = match file.metadata().await {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => return respond(res, server_name, HttpStatus::NOT_FOUND).await,
        Err(_) => return respond(res, server_name, HttpStatus::INTERNAL_SERVER_ERROR).await,
    };

    let mut headers = responses::base_headers(server_name, 0);
    headers.replace("Content-Length", &len.to_string());
    headers.replace("Content-Type", guess_mime(&full_path));

    res.write_status_line(HttpStatus::OK).await?;
    res.write_headers(&headers).await?;
    res.write_body_from(file).await?;
    Ok(())
}

async fn respond(
    res: &mut ResponseWriter<'_>,
    server_name: &str,
    status: HttpStatus,
) -> Result<(), WriterError> {
    responses::write_page(res, server_name, status, responses::page_for(status)).await
}

/// Joins `rel_path` onto `root`, dropping any query string. Returns `None`
/// for paths that would escape `root` or name nothing.
fn sanitize_path(root: &Path, rel_path: &str) -> Option<PathBuf> {
    let rel_path = rel_path.split(['?', '#']).next().unwrap_or("");

    let mut full = root.to_path_buf();
    let mut segments = 0;
    for segment in rel_path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." || segment.contains('\\') {
            return None;
        }
        full.push(segment);
        segments += 1;
    }

    (segments > 0).then_some(full)
}

fn guess_mime(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("htm") | Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain",
        Some("pdf") => "application/pdf",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
