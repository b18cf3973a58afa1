use crate::domain::{Result, SessionInfo};
use async_trait::async_trait;
use uuid::Uuid;

/// Port for tracking active sessions
#[async_trait]
pub trait TrackingPort: Send + Sync {
    /// Register a new session
    async fn track_session(&self, info: SessionInfo) -> Result<()>;

    /// Mark a session as closed
    async fn close_session(&self, id: Uuid) -> Result<()>;

    /// Get all sessions that are still open
    async fn get_active_sessions(&self) -> Result<Vec<SessionInfo>>;
}
