use crate::auth::CurrentUser;
use crate::errors::AppResult;
use crate::extract::ApiJson;
use crate::services::users;
use crate::state::AppState;
use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct Registered {
    pub user_name: String,
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub token: Uuid,
    pub user_name: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> AppResult<(StatusCode, Json<Registered>)> {
    let user_name =
        users::register(&state.repo, credentials.user_name, credentials.password).await?;
    Ok((StatusCode::CREATED, Json(Registered { user_name })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> AppResult<Json<Session>> {
    let user_name =
        users::authenticate(&state.repo, credentials.user_name, credentials.password).await?;
    let token = state.sessions.create(&user_name);
    info!("{} logged in", user_name);
    Ok(Json(Session { token, user_name }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> StatusCode {
    state.sessions.remove(&user.token);
    info!("{} logged out", user.user_name);
    StatusCode::NO_CONTENT
}
