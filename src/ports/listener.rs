use crate::domain::Result;

/// Port notified of the proxy lifecycle and of every forwarded chunk.
///
/// Hooks run inline on the forwarding path, so a slow implementation throttles
/// the direction it is called from. Implementations are shared by every
/// session and must handle concurrent calls themselves.
///
/// A hook returning `Err` (or panicking) is logged and otherwise ignored:
/// forwarding always continues.
pub trait ProxyListener: Send + Sync {
    /// Called once, after the listen socket is bound and before any accept.
    fn on_start(&self) -> Result<()> {
        Ok(())
    }

    /// Called once, while the server is stopping.
    fn on_stop(&self) -> Result<()> {
        Ok(())
    }

    /// Bytes read from the accepted side, before they are written to the target.
    fn on_request(&self, message: &[u8]) -> Result<()>;

    /// Bytes read from the target, before they are written to the accepted side.
    fn on_response(&self, message: &[u8]) -> Result<()>;
}
