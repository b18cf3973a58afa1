#![cfg(test)]
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tcpbridge::adapters::{SessionTracker, TcpConnector, TcpProxyServer};
use tcpbridge::domain::{ProxyConfig, ProxyService};
use tcpbridge::ports::{ProxyListener, TrackingPort};

/// A running proxy on an ephemeral loopback port.
pub struct ProxyFixture {
    pub server: TcpProxyServer,
    pub tracker: Arc<SessionTracker>,
    addr: SocketAddr,
}

impl ProxyFixture {
    pub async fn start(target_port: u16, listener: Arc<dyn ProxyListener>) -> Self {
        Self::start_with(base_config(target_port), listener).await
    }

    pub async fn start_with(config: ProxyConfig, listener: Arc<dyn ProxyListener>) -> Self {
        let config = Arc::new(config);
        let tracker = Arc::new(SessionTracker::new());
        let tracking: Arc<dyn TrackingPort> = tracker.clone();

        let service = ProxyService::new(
            config.clone(),
            Arc::new(TcpConnector::from_config(&config)),
            listener,
            tracking,
        );
        let mut server = TcpProxyServer::new(Arc::new(service));
        let addr = server.start().await.expect("proxy should start");

        Self { server, tracker, addr }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn active_sessions(&self) -> usize {
        self.tracker.get_active_sessions().await.unwrap().len()
    }

    /// Poll until the tracker reports `expected` open sessions or `limit` elapses.
    pub async fn wait_for_sessions(&self, expected: usize, limit: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            let active = self.active_sessions().await;
            if active == expected || tokio::time::Instant::now() >= deadline {
                return active;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn stop(&mut self) {
        self.server.stop().await.expect("proxy should stop");
    }
}

pub fn base_config(target_port: u16) -> ProxyConfig {
    ProxyConfig::new(0, "127.0.0.1", target_port)
        .with_listen_host("127.0.0.1")
        .with_dial_timeout(Duration::from_secs(2))
        .with_shutdown_grace(Duration::from_secs(2))
}
