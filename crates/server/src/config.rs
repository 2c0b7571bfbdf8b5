//! Server configuration.
//!
//! Every setting can come from a command-line flag or a `MOVIE_WEB_*`
//! environment variable (the binary loads `.env` first).

use crate::services::{ServiceError, SharedRepository};
use clap::{Args, ValueEnum};
use repository::{DatabaseRepository, MemoryRepository};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RepositoryKind {
    /// Load the CSV dataset into process memory on every start
    Memory,
    /// Persist to an SQLite file, populating it when empty
    Database,
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Which repository implementation backs the app
    #[arg(long, env = "MOVIE_WEB_REPOSITORY", value_enum, default_value_t = RepositoryKind::Memory)]
    pub repository: RepositoryKind,

    /// SQLite file used by the database repository
    #[arg(long, env = "MOVIE_WEB_DATABASE", default_value = "movies.db")]
    pub database_path: PathBuf,

    /// Directory holding Data1000Movies.csv, users.csv and comments.csv
    #[arg(long, env = "MOVIE_WEB_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Address the HTTP server listens on
    #[arg(long, env = "MOVIE_WEB_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Wipe and repopulate the database on start
    #[arg(long, env = "MOVIE_WEB_TESTING")]
    pub testing: bool,
}

impl ServerConfig {
    /// Config for the in-memory repository over `data_dir`
    pub fn memory(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository: RepositoryKind::Memory,
            database_path: PathBuf::from("movies.db"),
            data_dir: data_dir.into(),
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            testing: false,
        }
    }

    /// Build the configured repository, loading data where needed.
    ///
    /// The database is (re)populated when it is empty or `testing` is set.
    pub fn open_repository(&self) -> Result<SharedRepository, ServiceError> {
        match self.repository {
            RepositoryKind::Memory => {
                info!("Using memory repository with data from {:?}", self.data_dir);
                Ok(Arc::new(MemoryRepository::populate(&self.data_dir)?))
            }
            RepositoryKind::Database => {
                let repo = DatabaseRepository::open(&self.database_path)?;
                if self.testing || repo.is_empty()? {
                    info!("Populating database {:?} from {:?}", self.database_path, self.data_dir);
                    repo.clear()?;
                    repo.populate_from_dir(&self.data_dir)?;
                } else {
                    info!("Reusing populated database {:?}", self.database_path);
                }
                Ok(Arc::new(repo))
            }
        }
    }
}
