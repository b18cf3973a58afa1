mod acceptor;
mod connector;
pub mod wiretap;

pub use acceptor::TcpProxyServer;
pub use connector::TcpConnector;
pub use wiretap::Wiretap;
