use crate::errors::AppResult;
use crate::services::{GenreLink, HomePage, catalogue};
use crate::state::AppState;
use axum::{Json, extract::State};

pub async fn home(State(state): State<AppState>) -> AppResult<Json<HomePage>> {
    Ok(Json(catalogue::home_page(&state.repo).await?))
}

pub async fn genres(State(state): State<AppState>) -> AppResult<Json<Vec<GenreLink>>> {
    Ok(Json(catalogue::get_genre_links(&state.repo).await?))
}

pub async fn years(State(state): State<AppState>) -> AppResult<Json<Vec<u16>>> {
    Ok(Json(catalogue::get_years(&state.repo).await?))
}
