//! Connection handling and the TCP accept loop.
//!
//! This module only deals with moving bytes: it accepts connections, hands
//! each one its own task, and runs the per-connection loop
//! ([`serve_connection`]):
//!
//! 1. Read until one request is fully parsed
//!    (delegated to [`RequestReader`](crate::http::reader::RequestReader))
//! 2. Call the [`Handler`] with a
//!    [`ResponseWriter`](crate::http::response::ResponseWriter) bound to the
//!    same stream
//! 3. Close if the request said `Connection: close`, otherwise go back to 1
//!
//! A request that fails to parse gets a best-effort error status line and
//! the connection is closed. Parsing and writing never overlap within one
//! connection; connections share nothing but the handler.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_std::io::{Read, Write};
use async_std::net::TcpListener;
use async_std::task;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::handler::Handler;
use crate::http::reader::{ReadError, RequestReader};
use crate::http::response::{ResponseWriter, WriterError, default_headers};
use crate::http::status::HttpStatus;

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriterError),
}

pub struct Server<H> {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    handler: Arc<H>,
}

impl<H: Handler> Server<H> {
    pub async fn bind(config: ServerConfig, handler: H) -> io::Result<Self> {
        let listener = TcpListener::bind((config.address, config.port)).await?;

        Ok(Self {
            listener,
            config: Arc::new(config),
            handler: Arc::new(handler),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever, one task per connection.
    pub async fn run(self) -> io::Result<()> {
        info!(addr = %self.local_addr()?, "listening");

        loop {
            let (mut stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    accept_failed(&err).await;
                    continue;
                }
            };

            let config = Arc::clone(&self.config);
            let handler = Arc::clone(&self.handler);
            task::spawn(async move {
                debug!(%peer, "accepted connection");
                match serve_connection(&mut stream, handler.as_ref(), &config).await {
                    Ok(()) => debug!(%peer, "connection closed"),
                    Err(err) => warn!(%peer, %err, "connection aborted"),
                }
            });
        }
    }
}

async fn accept_failed(err: &io::Error) {
    warn!(%err, backoff = ?ACCEPT_BACKOFF, "failed to accept connection");
    task::sleep(ACCEPT_BACKOFF).await;
}

/// Runs request/response cycles on `stream` until the client closes it,
/// asks for `Connection: close`, sends something unparsable, or stays idle
/// past the read timeout.
pub async fn serve_connection<S, H>(
    stream: &mut S,
    handler: &H,
    config: &ServerConfig,
) -> Result<(), ConnectionError>
where
    S: Read + Write + Unpin + Send,
    H: Handler + ?Sized,
{
    let mut reader = RequestReader::new(config.limits());

    loop {
        let read = reader.read_request(stream);
        let next = async_std::future::timeout(config.read_timeout, read).await;
        let req = match next {
            Ok(Ok(req)) => req,
            Ok(Err(ReadError::ConnectionClosed)) => return Ok(()),
            Ok(Err(err @ ReadError::Io(_))) => return Err(err.into()),
            Ok(Err(err)) => {
                reject(stream, err).await;
                return Ok(());
            }
            Err(_) => {
                debug!(timeout = ?config.read_timeout, "idle connection timed out");
                return Ok(());
            }
        };
        debug!(method = req.method(), target = req.target(), "request");

        let mut res = ResponseWriter::new(stream);
        handler.handle(&mut res, &req).await?;
        res.flush().await?;

        if req.wants_close() {
            return Ok(());
        }
    }
}

/// Sends the error status for a request that could not be read, ignoring
/// write failures since the connection is closed right after.
async fn reject<S>(stream: &mut S, err: ReadError)
where
    S: Write + Unpin + Send,
{
    warn!(%err, "rejecting request");
    let Some(status) = err.into_http_status() else {
        return;
    };

    let mut res = ResponseWriter::new(stream);
    if let Err(err) = write_error(&mut res, status).await {
        debug!(%err, "could not send error response");
    }
}

async fn write_error(res: &mut ResponseWriter<'_>, status: HttpStatus) -> Result<(), WriterError> {
    let mut headers = default_headers(0);
    headers.set("Connection", "close");

    res.write_status_line(status).await?;
    res.write_headers(&headers).await?;
    res.flush().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::handler::HandlerFuture;
    use crate::http::request::HttpRequest;
    use crate::test_util::{BrokenPipe, MockStream, Stalled};

    /// Answers every request with its target as the body.
    #[derive(Default)]
    struct EchoTarget {
        calls: AtomicUsize,
    }

    impl EchoTarget {
        async fn respond(
            &self,
            res: &mut ResponseWriter<'_>,
            req: &HttpRequest,
        ) -> Result<(), WriterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = req.target().as_bytes();
            res.write_status_line(HttpStatus::OK).await?;
            res.write_headers(&default_headers(body.len())).await?;
            res.write_body(body).await?;
            Ok(())
        }
    }

    impl Handler for EchoTarget {
        fn handle<'a, 'w: 'a>(
            &'a self,
            res: &'a mut ResponseWriter<'w>,
            req: &'a HttpRequest,
        ) -> HandlerFuture<'a> {
            Box::pin(self.respond(res, req))
        }
    }

    const REJECTED: &str = "HTTP/1.1 400 Bad Request\r\n\
        content-length:0\r\ncontent-type:text/html\r\nconnection:close\r\n\r\n";

    fn response(target: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-length:{}\r\ncontent-type:text/html\r\n\r\n{target}",
            target.len()
        )
    }

    #[async_std::test]
    async fn keeps_connection_alive_without_close() {
        let input = "GET /one HTTP/1.1\r\nHost: x\r\n\r\n\
                     POST /two HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";
        let mut stream = MockStream::new(input, 3);
        let handler = EchoTarget::default();

        serve_connection(&mut stream, &handler, &ServerConfig::default())
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        assert_eq!(stream.output_str(), response("/one") + &response("/two"));
        // a third parse was attempted and found the stream closed
        assert_eq!(stream.eof_reads, 1);
    }

    #[async_std::test]
    async fn connection_close_ends_after_one_cycle() {
        let input = "GET /one HTTP/1.1\r\nConnection: close\r\n\r\nGET /two HTTP/1.1\r\n\r\n";
        let mut stream = MockStream::new(input, 1024);
        let handler = EchoTarget::default();

        serve_connection(&mut stream, &handler, &ServerConfig::default())
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(stream.output_str(), response("/one"));
        assert_eq!(stream.eof_reads, 0);
    }

    #[async_std::test]
    async fn single_request_without_close_reads_again() {
        let mut stream = MockStream::new("GET / HTTP/1.1\r\n\r\n", 1024);
        let handler = EchoTarget::default();

        serve_connection(&mut stream, &handler, &ServerConfig::default())
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(stream.eof_reads, 1);
    }

    #[async_std::test]
    async fn malformed_request_gets_bad_request_and_close() {
        let input = "get / HTTP/1.1\r\n\r\nGET /never HTTP/1.1\r\n\r\n";
        let mut stream = MockStream::new(input, 1024);
        let handler = EchoTarget::default();

        serve_connection(&mut stream, &handler, &ServerConfig::default())
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(stream.output_str(), REJECTED);
    }

    #[async_std::test]
    async fn error_after_good_request() {
        let input = "GET /ok HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\nBad Header\r\n\r\n";
        let mut stream = MockStream::new(input, 5);
        let handler = EchoTarget::default();

        serve_connection(&mut stream, &handler, &ServerConfig::default())
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        let out = stream.output_str();
        assert!(out.starts_with(&response("/ok")));
        assert!(out.ends_with(REJECTED));
    }

    #[async_std::test]
    async fn truncated_request_is_not_handled() {
        let mut stream = MockStream::new("POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc", 8);
        let handler = EchoTarget::default();

        serve_connection(&mut stream, &handler, &ServerConfig::default())
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
        assert!(stream.output_str().starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[async_std::test]
    async fn idle_connection_times_out() {
        let config = ServerConfig {
            read_timeout: Duration::from_millis(20),
            ..ServerConfig::default()
        };
        let handler = EchoTarget::default();

        serve_connection(&mut Stalled, &handler, &config)
            .await
            .unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[async_std::test]
    async fn accept_failure_backs_off() {
        let err = io::Error::from_raw_os_error(24); // EMFILE
        let started = std::time::Instant::now();

        accept_failed(&err).await;

        assert!(started.elapsed() >= ACCEPT_BACKOFF);
    }

    #[async_std::test]
    async fn write_failure_aborts_connection() {
        struct ReadOkWriteFails {
            input: MockStream,
        }

        impl Read for ReadOkWriteFails {
            fn poll_read(
                mut self: std::pin::Pin<&mut Self>,
                cx: &mut std::task::Context<'_>,
                buf: &mut [u8],
            ) -> std::task::Poll<io::Result<usize>> {
                std::pin::Pin::new(&mut self.input).poll_read(cx, buf)
            }
        }

        impl Write for ReadOkWriteFails {
            fn poll_write(
                self: std::pin::Pin<&mut Self>,
                cx: &mut std::task::Context<'_>,
                buf: &[u8],
            ) -> std::task::Poll<io::Result<usize>> {
                std::pin::Pin::new(&mut BrokenPipe).poll_write(cx, buf)
            }

            fn poll_flush(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
            ) -> std::task::Poll<io::Result<()>> {
                std::task::Poll::Ready(Ok(()))
            }

            fn poll_close(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
            ) -> std::task::Poll<io::Result<()>> {
                std::task::Poll::Ready(Ok(()))
            }
        }

        let mut stream = ReadOkWriteFails {
            input: MockStream::new("GET / HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\n\r\n", 1024),
        };
        let handler = EchoTarget::default();

        let err = serve_connection(&mut stream, &handler, &ServerConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::Write(WriterError::Io(_))));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }
}
