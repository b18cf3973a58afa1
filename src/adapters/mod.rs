pub mod listeners;
pub mod tcp_server;
pub mod tracking;

pub use listeners::{ConsoleListener, MetricsListener, NoopListener};
pub use tcp_server::{TcpConnector, TcpProxyServer, Wiretap};
pub use tracking::*;
