//! Connection bootstrap for the SQLite repository.
//!
//! Returned connections always have `foreign_keys=ON` and every migration
//! applied.

use super::migrations::apply_migrations;
use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Open (or create) a database file and bring its schema up to date.
pub fn open_db(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!("Opening database {:?}", path);

    let mut conn = Connection::open(path).inspect_err(|err| {
        error!("Failed to open database {:?}: {}", path, err);
    })?;
    bootstrap(&mut conn, started_at)?;
    Ok(conn)
}

/// Open a private in-memory database with the full schema.
pub fn open_db_in_memory() -> Result<Connection> {
    let started_at = Instant::now();
    let mut conn = Connection::open_in_memory()?;
    bootstrap(&mut conn, started_at)?;
    Ok(conn)
}

fn bootstrap(conn: &mut Connection, started_at: Instant) -> Result<()> {
    let result = configure(conn);
    match &result {
        Ok(()) => info!("Database ready in {:?}", started_at.elapsed()),
        Err(err) => error!("Database bootstrap failed after {:?}: {}", started_at.elapsed(), err),
    }
    result
}

fn configure(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)
}
