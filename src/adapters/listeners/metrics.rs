use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::Result;
use crate::ports::ProxyListener;

/// Process-wide event counters.
#[derive(Debug, Default)]
pub struct MetricsListener {
    starts: AtomicU64,
    stops: AtomicU64,
    requests: AtomicU64,
    responses: AtomicU64,
    request_bytes: AtomicU64,
    response_bytes: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub starts: u64,
    pub stops: u64,
    pub requests: u64,
    pub responses: u64,
    pub request_bytes: u64,
    pub response_bytes: u64,
}

impl MetricsListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            starts: self.starts.load(Ordering::Relaxed),
            stops: self.stops.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            responses: self.responses.load(Ordering::Relaxed),
            request_bytes: self.request_bytes.load(Ordering::Relaxed),
            response_bytes: self.response_bytes.load(Ordering::Relaxed),
        }
    }
}

impl ProxyListener for MetricsListener {
    fn on_start(&self) -> Result<()> {
        self.starts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn on_stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn on_request(&self, message: &[u8]) -> Result<()> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.request_bytes.fetch_add(message.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn on_response(&self, message: &[u8]) -> Result<()> {
        self.responses.fetch_add(1, Ordering::Relaxed);
        self.response_bytes.fetch_add(message.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}
