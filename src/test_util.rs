//! In-memory duplex streams for driving the reader, writer and connection
//! loop without sockets.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_std::io::{Read, Write};

/// Serves `input` at most `fragment` bytes per read and records every write.
pub(crate) struct MockStream {
    input: Vec<u8>,
    pos: usize,
    fragment: usize,
    interrupt_next: bool,
    pub output: Vec<u8>,
    /// Reads that found the input exhausted.
    pub eof_reads: usize,
}

impl MockStream {
    pub fn new(input: impl Into<Vec<u8>>, fragment: usize) -> Self {
        Self {
            input: input.into(),
            pos: 0,
            fragment,
            interrupt_next: false,
            output: Vec::new(),
            eof_reads: 0,
        }
    }

    /// Makes the next read fail with `ErrorKind::Interrupted`.
    pub fn interrupted(mut self) -> Self {
        self.interrupt_next = true;
        self
    }

    pub fn unread(&self) -> usize {
        self.input.len() - self.pos
    }

    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Read for MockStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if std::mem::take(&mut this.interrupt_next) {
            return Poll::Ready(Err(io::ErrorKind::Interrupted.into()));
        }

        let n = this.fragment.min(buf.len()).min(this.input.len() - this.pos);
        buf[..n].copy_from_slice(&this.input[this.pos..this.pos + n]);
        this.pos += n;
        if n == 0 {
            this.eof_reads += 1;
        }
        Poll::Ready(Ok(n))
    }
}

impl Write for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut().output.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A sink whose peer has gone away.
pub(crate) struct BrokenPipe;

impl Write for BrokenPipe {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A peer that connects and then never sends anything.
pub(crate) struct Stalled;

impl Read for Stalled {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Pending
    }
}

impl Write for Stalled {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
