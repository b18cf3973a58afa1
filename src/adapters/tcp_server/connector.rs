use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::wiretap::Wiretap;
use crate::domain::{ProxyConfig, ProxyError, Result};
use crate::ports::{Connection, ConnectorPort};

/// Dials the target over plain TCP, one fresh socket per session.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    dial_timeout: Option<Duration>,
    wiretap: bool,
}

impl TcpConnector {
    pub fn new(dial_timeout: Option<Duration>) -> Self {
        Self {
            dial_timeout,
            wiretap: false,
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            dial_timeout: config.dial_timeout(),
            wiretap: config.wiretap,
        }
    }

    pub fn with_wiretap(mut self, wiretap: bool) -> Self {
        self.wiretap = wiretap;
        self
    }

    async fn dial(&self, target: &str, host: &str, port: u16) -> Result<TcpStream> {
        let connecting = TcpStream::connect((host, port));
        let stream = match self.dial_timeout {
            Some(limit) => match timeout(limit, connecting).await {
                Ok(dialed) => dialed,
                Err(_) => {
                    log::debug!("Timeout connecting to {} after {:?}", target, limit);
                    return Err(ProxyError::Timeout);
                }
            },
            None => connecting.await,
        };

        stream.map_err(|err| {
            log::debug!("Failed to connect to {}: {}", target, err);
            ProxyError::dial(target, err)
        })
    }
}

#[async_trait]
impl ConnectorPort for TcpConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn Connection>> {
        let target = format!("{}:{}", host, port);
        let stream = self.dial(&target, host, port).await?;

        if let Err(err) = stream.set_nodelay(true) {
            log::debug!("Could not disable Nagle on {}: {}", target, err);
        }
        log::debug!("Connected to {} from {:?}", target, stream.local_addr().ok());

        if self.wiretap {
            Ok(Box::new(Wiretap::new(stream, "outbound")))
        } else {
            Ok(Box::new(stream))
        }
    }
}
