use crate::domain::Result;
use crate::ports::ProxyListener;

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ProxyListener for NoopListener {
    fn on_request(&self, _: &[u8]) -> Result<()> {
        Ok(())
    }

    fn on_response(&self, _: &[u8]) -> Result<()> {
        Ok(())
    }
}
