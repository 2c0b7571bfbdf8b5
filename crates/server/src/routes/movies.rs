use crate::auth::CurrentUser;
use crate::errors::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::catalogue::{self, DEFAULT_PAGE_SIZE};
use crate::services::{
    GenrePage, MovieDetail, MovieSummary, PersonMovies, ReviewView, YearPage, users,
};
use crate::state::AppState;
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use data_loader::MovieId;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub cursor: usize,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct NewReview {
    pub review_text: String,
    pub rating: u8,
}

pub async fn by_year(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<YearQuery>,
) -> AppResult<Json<YearPage>> {
    Ok(Json(catalogue::movies_by_year(&state.repo, query.year).await?))
}

pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    Ok(Json(catalogue::search_movies(&state.repo, query.title).await?))
}

pub async fn by_genre(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> AppResult<Json<GenrePage>> {
    let page_size = page.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    Ok(Json(
        catalogue::movies_by_genre(&state.repo, name, page.cursor, page_size).await?,
    ))
}

pub async fn by_actor(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
) -> AppResult<Json<PersonMovies>> {
    Ok(Json(catalogue::movies_for_actor(&state.repo, name).await?))
}

pub async fn by_director(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
) -> AppResult<Json<PersonMovies>> {
    Ok(Json(catalogue::movies_for_director(&state.repo, name).await?))
}

pub async fn detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MovieId>,
) -> AppResult<Json<MovieDetail>> {
    Ok(Json(catalogue::get_movie(&state.repo, id).await?))
}

pub async fn reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MovieId>,
) -> AppResult<Json<Vec<ReviewView>>> {
    Ok(Json(users::get_reviews_for_movie(&state.repo, id).await?))
}

pub async fn add_review(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<MovieId>,
    ApiJson(review): ApiJson<NewReview>,
) -> AppResult<(StatusCode, Json<ReviewView>)> {
    let view = users::add_review(
        &state.repo,
        id,
        review.review_text,
        review.rating,
        user.user_name,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(view)))
}
