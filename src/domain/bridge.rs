//! Couples two open connections into one session.
//!
//! [`Bridge::bridge`] wires `inbound -> outbound` as the request pump and
//! `outbound -> inbound` as the response pump. Both pumps live in a single
//! task: when either one stops, or the [`BridgeHandle`] is disposed, both pump
//! futures are dropped together with the four stream halves, which closes both
//! connections.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::pump::Pump;
use super::signal::{self, Signal, Trigger};
use super::{Direction, PumpReport, SessionSummary, Teardown};
use crate::ports::ProxyListener;

#[derive(Clone)]
pub struct Bridge {
    listener: Arc<dyn ProxyListener>,
    chunk_size: usize,
}

impl Bridge {
    pub fn new(listener: Arc<dyn ProxyListener>, chunk_size: usize) -> Self {
        Self { listener, chunk_size }
    }

    /// Start both pumps for `inbound` and `outbound`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bridge<A, B>(&self, id: Uuid, inbound: A, outbound: B) -> BridgeHandle
    where
        A: AsyncRead + AsyncWrite + Send + 'static,
        B: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (trigger, disposed) = signal::channel();
        let task = tokio::spawn(run_session(
            id,
            inbound,
            outbound,
            self.listener.clone(),
            self.chunk_size,
            disposed,
        ));

        BridgeHandle {
            id,
            trigger,
            task,
            summary: None,
        }
    }
}

/// Owner of a running session. Dropping it disposes the session.
pub struct BridgeHandle {
    id: Uuid,
    trigger: Trigger,
    task: JoinHandle<SessionSummary>,
    summary: Option<SessionSummary>,
}

impl BridgeHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Cancel both pumps and close both connections.
    ///
    /// Returns `true` for the first call only; later calls do nothing.
    pub fn dispose(&self) -> bool {
        let first = self.trigger.fire();
        if first {
            debug!(session = %self.id, "disposing bridge");
        }
        first
    }

    pub fn is_disposed(&self) -> bool {
        self.trigger.is_fired()
    }

    pub fn is_finished(&self) -> bool {
        self.summary.is_some() || self.task.is_finished()
    }

    /// Wait for the session to end, whatever the cause.
    pub async fn closed(&mut self) -> SessionSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        let summary = match (&mut self.task).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!(session = %self.id, error = %err, "session task did not complete");
                SessionSummary {
                    id: self.id,
                    request: PumpReport::default(),
                    response: PumpReport::default(),
                    teardown: Teardown::Aborted(err.to_string()),
                }
            }
        };
        self.summary = Some(summary.clone());
        summary
    }
}

async fn run_session<A, B>(
    id: Uuid,
    inbound: A,
    outbound: B,
    listener: Arc<dyn ProxyListener>,
    chunk_size: usize,
    mut disposed: Signal,
) -> SessionSummary
where
    A: AsyncRead + AsyncWrite + Send + 'static,
    B: AsyncRead + AsyncWrite + Send + 'static,
{
    let request = Pump::new(Direction::Request, chunk_size, listener.clone());
    let response = Pump::new(Direction::Response, chunk_size, listener);

    let (inbound_read, inbound_write) = tokio::io::split(inbound);
    let (outbound_read, outbound_write) = tokio::io::split(outbound);

    debug!(session = %id, "bridging inbound -> outbound and outbound -> inbound");

    let teardown = {
        let forward = request.run(inbound_read, outbound_write);
        let backward = response.run(outbound_read, inbound_write);
        tokio::pin!(forward);
        tokio::pin!(backward);

        tokio::select! {
            exit = &mut forward => exit.into_teardown(request.direction()),
            exit = &mut backward => exit.into_teardown(response.direction()),
            _ = disposed.fired() => Teardown::Disposed,
        }
        // Both pumps and every stream half are dropped here.
    };

    let summary = SessionSummary {
        id,
        request: request.report(),
        response: response.report(),
        teardown,
    };

    debug!(
        session = %id,
        teardown = %summary.teardown,
        request_bytes = summary.request.bytes,
        response_bytes = summary.response.bytes,
        "bridge closed"
    );

    summary
}
