#![cfg(test)]
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod proxy_fixture;
pub mod recording_listener;
pub mod targets;

pub use proxy_fixture::ProxyFixture;
pub use recording_listener::{Event, RecordingListener};
pub use targets::{closed_port, TestTarget};

use std::time::Duration;

/// Upper bound for every wait in the end-to-end suites.
pub const WAIT: Duration = Duration::from_secs(5);
