//! Request-independent application logic.
//!
//! Handlers call into these functions and only translate the results to
//! HTTP. Repository calls are synchronous, so every one of them runs on the
//! blocking thread pool via [`blocking`].

pub mod catalogue;
pub mod users;
pub mod views;

use data_loader::MovieId;
use repository::{MovieRepository, RepositoryError};
use std::sync::Arc;
use thiserror::Error;

pub use views::{
    GenreLink, GenrePage, HomePage, MovieDetail, MovieSummary, PersonMovies, ReviewView, YearPage,
};

pub type SharedRepository = Arc<dyn MovieRepository>;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Movie not found: {0}")]
    MovieNotFound(MovieId),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("User name already taken: {0}")]
    NameNotUnique(String),

    #[error("Invalid user name or password")]
    AuthenticationFailed,

    /// Input rejected before it reached the repository
    #[error("{0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UnknownMovie(id) => Self::MovieNotFound(id),
            RepositoryError::UnknownUser(name) => Self::UnknownUser(name),
            RepositoryError::DuplicateUser(name) => Self::NameNotUnique(name),
            other => Self::Repository(other),
        }
    }
}

/// Run a repository closure on the blocking pool.
pub(crate) async fn blocking<T, F>(repo: &SharedRepository, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn MovieRepository) -> repository::Result<T> + Send + 'static,
{
    let repo = Arc::clone(repo);
    let value = tokio::task::spawn_blocking(move || f(repo.as_ref())).await??;
    Ok(value)
}
