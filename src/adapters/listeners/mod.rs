mod console;
mod metrics;
mod noop;

pub use console::ConsoleListener;
pub use metrics::{MetricsListener, MetricsSnapshot};
pub use noop::NoopListener;
