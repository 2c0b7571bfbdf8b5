//! # Data Loader Crate
//!
//! Domain model and CSV ingestion for the movie catalogue.
//!
//! ## Main Components
//!
//! - **types**: Domain types (Movie, Genre, Actor, Director, Review, User, DataSet)
//! - **parser**: Parse the movie, user and comment CSV files
//! - **index**: Build a validated `DataSet` from a data directory
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataSet;
//! use std::path::Path;
//!
//! let data = DataSet::load_from_dir(Path::new("data"))?;
//!
//! let movie = data.get_movie(1).unwrap();
//! let action = data.get_movie_ids_for_genre(&Genre::new("Action"));
//!
//! println!("{} is one of {} action movies", movie.title, action.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{COMMENTS_FILE, MOVIES_FILE, USERS_FILE};
pub use types::{
    // Type aliases
    MovieId,
    UserId,
    // Core types
    Actor,
    CommentRecord,
    DataSet,
    Director,
    Genre,
    Movie,
    Review,
    User,
    UserRecord,
    // Helpers
    normalize_user_name,
    MIN_YEAR,
    TIMESTAMP_FORMAT,
};
