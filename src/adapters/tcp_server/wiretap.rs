use std::fmt::Write as _;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::ports::{Connection, ConnectionMetadata};

/// Bytes shown per logged chunk.
const PREVIEW: usize = 32;

/// Connection wrapper that traces every read, write and close.
///
/// Logs go to this module's target at `trace` level, so they only appear when
/// wiretapping is enabled in the filter.
pub struct Wiretap<T> {
    inner: T,
    label: String,
}

impl<T: Connection> Wiretap<T> {
    pub fn new(inner: T, side: &str) -> Self {
        let meta = inner.metadata();
        let label = match (meta.local_addr, meta.peer_addr) {
            (Some(local), Some(peer)) => format!("{} {} -> {}", side, local, peer),
            (_, Some(peer)) => format!("{} -> {}", side, peer),
            _ => side.to_string(),
        };
        Self { inner, label }
    }
}

impl<T> Wiretap<T> {
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for Wiretap<T> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<std::io::Result<()>> {
        let before = buf.filled().len();
        let polled = Pin::new(&mut self.inner).poll_read(cx, buf);
        match &polled {
            Poll::Ready(Ok(())) => {
                let read = &buf.filled()[before..];
                if read.is_empty() {
                    log::trace!("[{}] READ EOF", self.label);
                } else {
                    log::trace!("[{}] READ {}B {}", self.label, read.len(), hex_preview(read));
                }
            }
            Poll::Ready(Err(err)) => log::trace!("[{}] READ failed: {}", self.label, err),
            Poll::Pending => {}
        }
        polled
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for Wiretap<T> {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        let polled = Pin::new(&mut self.inner).poll_write(cx, buf);
        match &polled {
            Poll::Ready(Ok(n)) => log::trace!("[{}] WRITE {}B {}", self.label, n, hex_preview(&buf[..*n])),
            Poll::Ready(Err(err)) => log::trace!("[{}] WRITE failed: {}", self.label, err),
            Poll::Pending => {}
        }
        polled
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let polled = Pin::new(&mut self.inner).poll_shutdown(cx);
        if let Poll::Ready(outcome) = &polled {
            match outcome {
                Ok(()) => log::trace!("[{}] FIN", self.label),
                Err(err) => log::trace!("[{}] FIN failed: {}", self.label, err),
            }
        }
        polled
    }
}

impl<T: Connection> Connection for Wiretap<T> {
    fn metadata(&self) -> ConnectionMetadata {
        self.inner.metadata()
    }
}

impl<T> Drop for Wiretap<T> {
    fn drop(&mut self) {
        log::trace!("[{}] CLOSE", self.label);
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(PREVIEW * 3 + 3);
    for (i, byte) in bytes.iter().take(PREVIEW).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02x}", byte);
    }
    if bytes.len() > PREVIEW {
        out.push_str(" ..");
    }
    out
}
