//! # Repository Crate
//!
//! Storage for the movie catalogue behind one trait, [`MovieRepository`],
//! with two implementations:
//!
//! - [`MemoryRepository`]: everything in process memory, loaded from CSV
//! - [`DatabaseRepository`]: SQLite with versioned migrations
//!
//! ```ignore
//! use repository::{MemoryRepository, MovieRepository};
//! use std::path::Path;
//!
//! let repo = MemoryRepository::populate(Path::new("data"))?;
//! let nolan = repo.get_movies_for_director("Christopher Nolan")?;
//! ```

pub mod database;
pub mod error;
pub mod memory;
pub mod password;
pub mod traits;

pub use database::DatabaseRepository;
pub use error::{RepositoryError, Result};
pub use memory::MemoryRepository;
pub use password::{hash_password, verify_password};
pub use traits::MovieRepository;
