use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::bridge::Bridge;
use super::signal::Signal;
use super::{ProxyConfig, ProxyError, Result, SessionInfo, SessionSummary};
use crate::ports::{Connection, ConnectorPort, ProxyListener, TrackingPort};

/// Turns one accepted connection into a session: dial the target, bridge the
/// pair, track it until it closes.
#[derive(Clone)]
pub struct ProxyService {
    config: Arc<ProxyConfig>,
    connector: Arc<dyn ConnectorPort>,
    listener: Arc<dyn ProxyListener>,
    tracker: Arc<dyn TrackingPort>,
    bridge: Bridge,
}

impl ProxyService {
    pub fn new(
        config: Arc<ProxyConfig>,
        connector: Arc<dyn ConnectorPort>,
        listener: Arc<dyn ProxyListener>,
        tracker: Arc<dyn TrackingPort>,
    ) -> Self {
        let bridge = Bridge::new(listener.clone(), config.chunk_size);
        Self {
            config,
            connector,
            listener,
            tracker,
            bridge,
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn listener(&self) -> &Arc<dyn ProxyListener> {
        &self.listener
    }

    /// Serve `inbound` until either side closes or `shutdown` fires.
    ///
    /// A dial failure closes `inbound` without starting any pump.
    pub async fn handle_connection(
        &self,
        inbound: Box<dyn Connection>,
        mut shutdown: Signal,
    ) -> Result<SessionSummary> {
        let peer = inbound.metadata().peer_addr;
        let info = SessionInfo::new(peer, self.config.target_addr());
        let id = info.id;
        self.tracker.track_session(info).await?;

        let dialed = tokio::select! {
            dialed = self.connector.connect(&self.config.target_host, self.config.target_port) => dialed,
            _ = shutdown.fired() => Err(ProxyError::Dial("abandoned, server is stopping".to_string())),
        };

        let outbound = match dialed {
            Ok(outbound) => outbound,
            Err(err) => {
                warn!(
                    session = %id,
                    target = %self.config.target_addr(),
                    error = %err,
                    "dial failed, closing inbound connection"
                );
                drop(inbound);
                self.untrack(id).await;
                return Err(err);
            }
        };

        debug!(
            session = %id,
            peer = ?peer,
            outbound = ?outbound.metadata().peer_addr,
            "target dialed, starting bridge"
        );

        let mut handle = self.bridge.bridge(id, inbound, outbound);
        let summary = tokio::select! {
            summary = handle.closed() => summary,
            _ = shutdown.fired() => {
                handle.dispose();
                handle.closed().await
            }
        };

        self.untrack(id).await;
        info!(
            session = %id,
            teardown = %summary.teardown,
            request_bytes = summary.request.bytes,
            response_bytes = summary.response.bytes,
            "session closed"
        );

        summary.into_result()
    }

    async fn untrack(&self, id: Uuid) {
        if let Err(err) = self.tracker.close_session(id).await {
            warn!(session = %id, error = %err, "failed to untrack session");
        }
    }
}
