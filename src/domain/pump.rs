use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use super::events::{dispatch, ProxyEvent};
use super::{Direction, PumpReport, PumpState, Teardown};
use crate::ports::ProxyListener;

/// How a pump stopped.
#[derive(Debug)]
pub enum PumpExit {
    Eof,
    Failed(io::Error),
}

impl PumpExit {
    pub fn state(&self) -> PumpState {
        match self {
            PumpExit::Eof => PumpState::Closed,
            PumpExit::Failed(_) => PumpState::Errored,
        }
    }

    pub fn into_teardown(self, direction: Direction) -> Teardown {
        match self {
            PumpExit::Eof => Teardown::Eof(direction),
            PumpExit::Failed(err) => Teardown::Failed(direction, err.to_string()),
        }
    }
}

/// Unidirectional forwarding loop with a single fixed-size buffer.
///
/// A chunk is handed to the listener and fully written to the destination
/// before the next read is issued, so at most `chunk_size` bytes of one
/// direction are ever held by the proxy.
pub struct Pump {
    direction: Direction,
    chunk_size: usize,
    listener: Arc<dyn ProxyListener>,
    bytes: AtomicU64,
    chunks: AtomicU64,
}

impl Pump {
    pub fn new(direction: Direction, chunk_size: usize, listener: Arc<dyn ProxyListener>) -> Self {
        Self {
            direction,
            chunk_size: chunk_size.max(1),
            listener,
            bytes: AtomicU64::new(0),
            chunks: AtomicU64::new(0),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Totals written to the destination so far.
    pub fn report(&self) -> PumpReport {
        PumpReport {
            bytes: self.bytes.load(Ordering::Relaxed),
            chunks: self.chunks.load(Ordering::Relaxed),
        }
    }

    pub async fn run<R, W>(&self, mut source: R, mut destination: W) -> PumpExit
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = vec![0u8; self.chunk_size];
        let mut state = PumpState::Idle;

        loop {
            self.transition(&mut state, PumpState::Reading);
            let n = match source.read(&mut buf).await {
                Ok(0) => {
                    self.transition(&mut state, PumpState::Closed);
                    // Propagate the FIN; the session is torn down right after.
                    let _ = destination.shutdown().await;
                    return PumpExit::Eof;
                }
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.transition(&mut state, PumpState::Errored);
                    debug!(direction = %self.direction, error = %err, "read failed");
                    return PumpExit::Failed(err);
                }
            };

            self.transition(&mut state, PumpState::Forwarding);
            let chunk = &buf[..n];
            let _ = dispatch(self.listener.as_ref(), ProxyEvent::data(self.direction, chunk));

            if let Err(err) = write_chunk(&mut destination, chunk).await {
                self.transition(&mut state, PumpState::Errored);
                debug!(direction = %self.direction, error = %err, "write failed");
                return PumpExit::Failed(err);
            }

            self.bytes.fetch_add(n as u64, Ordering::Relaxed);
            self.chunks.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn transition(&self, state: &mut PumpState, next: PumpState) {
        trace!(direction = %self.direction, from = ?state, to = ?next, "pump state");
        *state = next;
    }
}

async fn write_chunk<W: AsyncWrite + Unpin>(destination: &mut W, chunk: &[u8]) -> io::Result<()> {
    destination.write_all(chunk).await?;
    destination.flush().await
}
