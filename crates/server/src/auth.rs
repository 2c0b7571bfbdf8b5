//! Bearer-token sessions.
//!
//! Logging in creates a random token mapped to the user name. Protected
//! routes sit behind [`require_auth`], which resolves the token and puts a
//! [`CurrentUser`] into the request extensions.

use crate::errors::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Authenticated caller of a protected route
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_name: String,
    pub token: Uuid,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, String>>,
}

impl SessionStore {
    pub fn create(&self, user_name: &str) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.write().insert(token, user_name.to_string());
        debug!("Opened session for {}", user_name);
        token
    }

    pub fn resolve(&self, token: &Uuid) -> Option<String> {
        self.sessions.read().get(token).cloned()
    }

    /// Drop a session; returns false if it did not exist
    pub fn remove(&self, token: &Uuid) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::unauthorized("Missing or malformed bearer token"))?;
    let user_name = state
        .sessions
        .resolve(&token)
        .ok_or_else(|| AppError::unauthorized("Session expired or unknown"))?;

    request.extensions_mut().insert(CurrentUser { user_name, token });
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ")?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn sessions_resolve_until_removed() {
        let store = SessionStore::default();
        let token = store.create("thorke");

        assert_eq!(store.resolve(&token).as_deref(), Some("thorke"));
        assert!(store.remove(&token));
        assert!(store.resolve(&token).is_none());
        assert!(!store.remove(&token));
        assert!(store.is_empty());
    }

    #[test]
    fn bearer_header_parsing() {
        let token = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some(token));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(bearer_token(&headers).is_none());
    }
}
