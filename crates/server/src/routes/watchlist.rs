use crate::auth::CurrentUser;
use crate::errors::AppResult;
use crate::extract::ApiJson;
use crate::services::{MovieSummary, users};
use crate::state::AppState;
use axum::{Extension, Json, extract::State};
use data_loader::MovieId;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WatchListEntry {
    pub movie_id: MovieId,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    Ok(Json(users::get_watch_list(&state.repo, user.user_name).await?))
}

pub async fn add(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(entry): ApiJson<WatchListEntry>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    Ok(Json(
        users::add_to_watch_list(&state.repo, user.user_name, entry.movie_id).await?,
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(entry): ApiJson<WatchListEntry>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    Ok(Json(
        users::remove_from_watch_list(&state.repo, user.user_name, entry.movie_id).await?,
    ))
}
