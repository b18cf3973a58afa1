pub mod connector;
pub mod listener;
pub mod tracking;

pub use connector::{Connection, ConnectionMetadata, ConnectorPort};
pub use listener::ProxyListener;
pub use tracking::TrackingPort;
