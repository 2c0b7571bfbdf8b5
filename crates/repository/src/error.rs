//! Error type shared by every repository implementation.

use data_loader::{DataLoadError, MovieId, UserId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A review was submitted without an author
    #[error("Review has no user attached")]
    MissingUser,

    #[error("User not found: {0}")]
    UnknownUser(String),

    #[error("Movie not found: {0}")]
    UnknownMovie(MovieId),

    #[error("User name already taken: {0}")]
    DuplicateUser(String),

    #[error("User id already taken: {0}")]
    DuplicateUserId(UserId),

    #[error("Failed to load dataset: {0}")]
    Load(#[from] DataLoadError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// A stored row could not be turned back into a domain value
    #[error("Invalid persisted data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
