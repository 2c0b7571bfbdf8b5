use crate::auth::SessionStore;
use crate::services::SharedRepository;
use std::sync::Arc;

/// Shared handler state: the repository and the login sessions
#[derive(Clone)]
pub struct AppState {
    pub repo: SharedRepository,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(repo: SharedRepository) -> Self {
        Self {
            repo,
            sessions: Arc::new(SessionStore::default()),
        }
    }
}
