use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProxyError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Per-run settings of the proxy. Built once at startup, shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub listen_host: String,
    pub listen_port: u16,
    pub target_host: String,
    pub target_port: u16,
    pub verbose: bool,
    pub debug: bool,
    pub wiretap: bool,
    pub chunk_size: usize,
    pub dial_timeout_ms: u64,
    pub shutdown_grace_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            listen_port: 0,
            target_host: String::new(),
            target_port: 0,
            verbose: true,
            debug: false,
            wiretap: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            dial_timeout_ms: 10_000,
            shutdown_grace_ms: 5_000,
        }
    }
}

impl ProxyConfig {
    pub fn new(listen_port: u16, target_host: impl Into<String>, target_port: u16) -> Self {
        Self {
            listen_port,
            target_host: target_host.into(),
            target_port,
            ..Default::default()
        }
    }

    pub fn with_listen_host(mut self, host: impl Into<String>) -> Self {
        self.listen_host = host.into();
        self
    }

    pub fn with_wiretap(mut self, wiretap: bool) -> Self {
        self.wiretap = wiretap;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_ms = grace.as_millis() as u64;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_host.trim().is_empty() {
            return Err(ProxyError::InvalidConfig("target host is required".to_string()));
        }
        if self.target_port == 0 {
            return Err(ProxyError::InvalidConfig("target port must be non-zero".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(ProxyError::InvalidConfig("chunk size must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    pub fn target_addr(&self) -> String {
        format!("{}:{}", self.target_host, self.target_port)
    }

    /// `None` when dialing is unbounded.
    pub fn dial_timeout(&self) -> Option<Duration> {
        match self.dial_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Direction of a forwarded chunk. Request flows from the accepted side
/// toward the target, response flows back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Request,
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Request => write!(f, "request"),
            Direction::Response => write!(f, "response"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Idle,
    Reading,
    Forwarding,
    Closed,
    Errored,
}

impl PumpState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PumpState::Closed | PumpState::Errored)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Binding,
    Listening,
    Stopping,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerState::Stopped => write!(f, "stopped"),
            ServerState::Binding => write!(f, "binding"),
            ServerState::Listening => write!(f, "listening"),
            ServerState::Stopping => write!(f, "stopping"),
        }
    }
}

/// Bookkeeping entry for one proxied conversation.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: Uuid,
    pub peer: Option<SocketAddr>,
    pub target: String,
    pub opened_at: Instant,
    pub closed_at: Option<Instant>,
}

impl SessionInfo {
    pub fn new(peer: Option<SocketAddr>, target: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            target,
            opened_at: Instant::now(),
            closed_at: None,
        }
    }

    pub fn close(&mut self) {
        self.closed_at = Some(Instant::now());
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// Totals of one pump at the moment its session was torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub bytes: u64,
    pub chunks: u64,
}

/// What ended a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Teardown {
    /// Source of the given direction reached end of stream.
    Eof(Direction),
    /// Read or write failed in the given direction.
    Failed(Direction, String),
    /// The bridge handle was disposed from outside.
    Disposed,
    /// The session task panicked or was cancelled before reporting.
    Aborted(String),
}

impl fmt::Display for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Teardown::Eof(direction) => write!(f, "{} side closed", direction),
            Teardown::Failed(direction, err) => write!(f, "{} pump failed: {}", direction, err),
            Teardown::Disposed => write!(f, "disposed"),
            Teardown::Aborted(err) => write!(f, "session task aborted: {}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub request: PumpReport,
    pub response: PumpReport,
    pub teardown: Teardown,
}

impl SessionSummary {
    pub fn into_result(self) -> Result<Self> {
        match &self.teardown {
            Teardown::Failed(direction, err) => Err(ProxyError::Relay(format!("{} pump: {}", direction, err))),
            Teardown::Aborted(err) => Err(ProxyError::Relay(format!("session task: {}", err))),
            _ => Ok(self),
        }
    }
}
