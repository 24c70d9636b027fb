use std::path::PathBuf;

use tracing::debug;

use crate::config::ServerConfig;
use crate::handler::{Handler, HandlerFuture, responses, static_files, stream};
use crate::http::request::HttpRequest;
use crate::http::response::{ResponseWriter, WriterError};
use crate::http::status::HttpStatus;

/// Demo routes served by the `rawhttp` binary.
///
/// - `/yourproblem`: 400 page
/// - `/myproblem`: 500 page
/// - `/stream/{n}`: `n` generated lines, chunked, with checksum trailers
/// - `/static/{path}`: file from the static root
/// - anything else: 200 page
#[derive(Debug, Clone)]
pub struct Router {
    server_name: String,
    static_root: PathBuf,
}

impl Router {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            server_name: config.server_name.clone(),
            static_root: PathBuf::from(&config.static_files_root),
        }
    }

    async fn route(
        &self,
        res: &mut ResponseWriter<'_>,
        req: &HttpRequest,
    ) -> Result<(), WriterError> {
        let path = req.target().split('?').next().unwrap_or("");
        debug!(method = req.method(), path, "routing request");

        if path == "/yourproblem" {
            return self.page(res, HttpStatus::BAD_REQUEST).await;
        }
        if path == "/myproblem" {
            return self.page(res, HttpStatus::INTERNAL_SERVER_ERROR).await;
        }
        if let Some(count) = path.strip_prefix("/stream/") {
            return match count.parse::<usize>() {
                Ok(lines) => stream::serve(res, &self.server_name, lines).await,
                Err(_) => self.page(res, HttpStatus::BAD_REQUEST).await,
            };
        }
        if let Some(file) = path.strip_prefix("/static/") {
            return static_files::serve(res, &self.static_root, &self.server_name, file).await;
        }

        self.page(res, HttpStatus::OK).await
    }

    async fn page(
        &self,
        res: &mut ResponseWriter<'_>,
        status: HttpStatus,
    ) -> Result<(), WriterError> {
        responses::write_page(res, &self.server_name, status, responses::page_for(status)).await
    }
}

impl Handler for Router {
    fn handle<'a, 'w: 'a>(
        &'a self,
        res: &'a mut ResponseWriter<'w>,
        req: &'a HttpRequest,
    ) -> HandlerFuture<'a> {
        Box::pin(self.route(res, req))
    }
}
