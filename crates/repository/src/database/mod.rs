//! SQLite-backed persistence: connection bootstrap, migrations, table
//! mapping and the [`DatabaseRepository`] itself.

pub mod mapping;
pub mod migrations;
mod open;
mod populate;
mod repository;

pub use mapping::Mapped;
pub use open::{open_db, open_db_in_memory};
pub use repository::DatabaseRepository;
