use crate::config::ServerConfig;
use crate::errors::AppError;
use crate::session::{DashboardSession, SessionStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let sessions = SessionStore::new(config.session_ttl, config.max_sessions);
        Self {
            config: Arc::new(config),
            sessions: Arc::new(Mutex::new(sessions)),
        }
    }

    /// Runs `apply` against one session while holding the store lock.
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut DashboardSession) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("session expired, reload the page"))?;
        apply(session)
    }
}
