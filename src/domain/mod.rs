pub mod bridge;
pub mod errors;
pub mod events;
pub mod models;
pub mod pump;
pub mod service;
pub mod signal;

pub use bridge::{Bridge, BridgeHandle};
pub use errors::*;
pub use events::{dispatch, ProxyEvent};
pub use models::*;
pub use service::ProxyService;
pub use signal::{Signal, Trigger};
