use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::wiretap::Wiretap;
use crate::domain::signal::{self, Signal, Trigger};
use crate::domain::{dispatch, ProxyError, ProxyEvent, ProxyService, Result, ServerState, SessionSummary};
use crate::ports::Connection;

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

struct Running {
    local_addr: SocketAddr,
    trigger: Trigger,
    accept_task: JoinHandle<()>,
}

/// Listens on the configured port and hands every accepted connection to
/// [`ProxyService`] in its own task.
///
/// The listener's `on_start` fires once the socket is bound and `on_stop`
/// fires once per successful `start`, after the accept loop has ended.
pub struct TcpProxyServer {
    service: Arc<ProxyService>,
    state: ServerState,
    running: Option<Running>,
}

impl TcpProxyServer {
    pub fn new(service: Arc<ProxyService>) -> Self {
        Self {
            service,
            state: ServerState::Stopped,
            running: None,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Bound address while the server is listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Bind the listen socket and start accepting in the background.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.state != ServerState::Stopped {
            return Err(ProxyError::InvalidState(format!("cannot start while {}", self.state)));
        }

        self.state = ServerState::Binding;
        let addr = self.service.config().listen_addr();
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(err) => {
                self.state = ServerState::Stopped;
                return Err(ProxyError::bind(&addr, err));
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(local_addr) => local_addr,
            Err(err) => {
                self.state = ServerState::Stopped;
                return Err(ProxyError::bind(&addr, err));
            }
        };

        info!(
            listen = %local_addr,
            target = %self.service.config().target_addr(),
            "listening"
        );
        let _ = dispatch(self.service.listener().as_ref(), ProxyEvent::Start);

        let (trigger, shutdown) = signal::channel();
        let accept_task = tokio::spawn(accept_loop(listener, self.service.clone(), shutdown));

        self.running = Some(Running {
            local_addr,
            trigger,
            accept_task,
        });
        self.state = ServerState::Listening;
        Ok(local_addr)
    }

    /// Stop accepting, dispose every live session and wait for them to close.
    ///
    /// Calling it on a stopped server does nothing.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        self.state = ServerState::Stopping;
        info!(listen = %running.local_addr, "stopping");
        running.trigger.fire();

        let grace = self.service.config().shutdown_grace();
        let mut accept_task = running.accept_task;
        match timeout(grace, &mut accept_task).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "accept loop ended abnormally"),
            Err(_) => {
                warn!(grace = ?grace, "sessions still open after grace period, aborting them");
                accept_task.abort();
                let _ = accept_task.await;
            }
        }

        let _ = dispatch(self.service.listener().as_ref(), ProxyEvent::Stop);
        self.state = ServerState::Stopped;
        Ok(())
    }

    /// Start, serve until `shutdown` completes, then stop.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await
    }
}

/// Best-effort shutdown for a server that was never stopped.
///
/// The accept task is aborted, which drops its listener and every session it
/// owns, but the sockets close once the runtime processes the cancellation,
/// possibly after `on_stop` has fired. Use [`TcpProxyServer::stop`] to wait
/// for them.
impl Drop for TcpProxyServer {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.trigger.fire();
            running.accept_task.abort();
            let _ = dispatch(self.service.listener().as_ref(), ProxyEvent::Stop);
        }
    }
}

async fn accept_loop(listener: TcpListener, service: Arc<ProxyService>, mut shutdown: Signal) {
    let wiretap = service.config().wiretap;
    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.fired() => break,
            Some(joined) = sessions.join_next(), if !sessions.is_empty() => session_finished(joined),
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "accepted connection");
                    if let Err(err) = stream.set_nodelay(true) {
                        debug!(peer = %peer, error = %err, "could not disable Nagle");
                    }

                    let inbound: Box<dyn Connection> = if wiretap {
                        Box::new(Wiretap::new(stream, "inbound"))
                    } else {
                        Box::new(stream)
                    };

                    let service = service.clone();
                    let signal = shutdown.clone();
                    sessions.spawn(async move { service.handle_connection(inbound, signal).await });
                }
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    sleep(ACCEPT_BACKOFF).await;
                }
            },
        }
    }

    drop(listener);
    if !sessions.is_empty() {
        debug!(sessions = sessions.len(), "waiting for open sessions to close");
    }
    while let Some(joined) = sessions.join_next().await {
        session_finished(joined);
    }
}

fn session_finished(joined: std::result::Result<Result<SessionSummary>, JoinError>) {
    match joined {
        Ok(Ok(_)) => {}
        // Dial failures were already reported by the service.
        Ok(Err(ProxyError::Dial(_))) | Ok(Err(ProxyError::Timeout)) => {}
        Ok(Err(err)) => debug!(error = %err, "session ended with error"),
        Err(err) => warn!(error = %err, "session task failed"),
    }
}
