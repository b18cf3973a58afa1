use crate::domain::{Result, SessionInfo};
use crate::ports::TrackingPort;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::info;
use uuid::Uuid;

/// How long a closed session stays visible before cleanup drops it.
const RETENTION: Duration = Duration::from_secs(4);

/// In-memory session tracker
pub struct SessionTracker {
    sessions: Arc<RwLock<Vec<SessionInfo>>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Start background cleanup task
    pub fn start_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let sessions = self.sessions.clone();

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(250));

            loop {
                ticker.tick().await;
                let now = Instant::now();
                sessions.write().await.retain(|session| retained(session, now));
            }
        })
    }

    /// Every known session, closed ones included until cleanup drops them.
    pub async fn snapshot(&self) -> Vec<SessionInfo> {
        self.sessions.read().await.clone()
    }
}

fn retained(session: &SessionInfo, now: Instant) -> bool {
    match session.closed_at {
        Some(closed_at) => now.duration_since(closed_at) < RETENTION,
        None => true,
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackingPort for SessionTracker {
    async fn track_session(&self, session: SessionInfo) -> Result<()> {
        info!(
            session = %session.id,
            peer = ?session.peer,
            "{} -> {}",
            session.peer.map(|p| p.to_string()).unwrap_or_else(|| "unknown".to_string()),
            session.target
        );

        self.sessions.write().await.push(session);
        Ok(())
    }

    async fn close_session(&self, id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;

        if let Some(session) = sessions.iter_mut().find(|s| s.id == id) {
            session.close();
        }

        Ok(())
    }

    async fn get_active_sessions(&self) -> Result<Vec<SessionInfo>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.iter().filter(|s| s.is_open()).cloned().collect())
    }
}
