use std::net::SocketAddr;

use crate::domain::Result;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::net::TcpStream;

/// Port for dialing the proxied target
#[async_trait]
pub trait ConnectorPort: Send + Sync {
    /// Open one new connection to `host:port`.
    ///
    /// Every call dials afresh: connections are never pooled or reused.
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Connection>>;
}

/// An open byte stream exclusively owned by one session.
///
/// Dropping the value closes it.
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin {
    fn metadata(&self) -> ConnectionMetadata;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMetadata {
    pub peer_addr: Option<SocketAddr>,
    pub local_addr: Option<SocketAddr>,
}

impl ConnectionMetadata {
    pub fn unknown() -> Self {
        Self {
            peer_addr: None,
            local_addr: None,
        }
    }
}

impl Connection for TcpStream {
    fn metadata(&self) -> ConnectionMetadata {
        ConnectionMetadata {
            peer_addr: self.peer_addr().ok(),
            local_addr: self.local_addr().ok(),
        }
    }
}

impl Connection for DuplexStream {
    fn metadata(&self) -> ConnectionMetadata {
        ConnectionMetadata::unknown()
    }
}
