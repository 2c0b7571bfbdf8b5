//! HTTP surface. Handlers stay thin: extract, call a service, wrap as JSON.

mod auth;
mod home;
mod movies;
mod watchlist;

use crate::auth::require_auth;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::home))
        .route("/genres", get(home::genres))
        .route("/years", get(home::years))
        .route("/movies", get(movies::by_year))
        .route("/movies/search", get(movies::search))
        .route("/movies/genre/{name}", get(movies::by_genre))
        .route("/movies/actor/{name}", get(movies::by_actor))
        .route("/movies/director/{name}", get(movies::by_director))
        .route("/movies/{id}", get(movies::detail))
        .route("/movies/{id}/reviews", get(movies::reviews))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes that need a logged-in user
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/movies/{id}/reviews", post(movies::add_review))
        .route(
            "/watchlist",
            get(watchlist::list)
                .post(watchlist::add)
                .delete(watchlist::remove),
        )
        .route("/auth/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
