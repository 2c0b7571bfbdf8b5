//! Table bindings for the domain types.
//!
//! Each [`Mapped`] impl names the table (or join) a type is read from, the
//! columns it needs and how a row turns back into the domain value.
//! Relationships (a movie's director, actors and genres) are not part of the
//! row; the repository attaches them afterwards through the junction tables.

use chrono::NaiveDateTime;
use data_loader::{Actor, Director, Genre, Movie, Review, User, TIMESTAMP_FORMAT};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Params, Row};

pub trait Mapped: Sized {
    /// Table, or join expression, the columns are selected from
    const TABLE: &'static str;
    /// Column list in the order `from_row` reads them
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn select_sql() -> String {
        format!("SELECT {} FROM {}", Self::COLUMNS.join(", "), Self::TABLE)
    }

    /// Run `SELECT <columns> FROM <table> <clause>` and map every row.
    fn query_all<P: Params>(conn: &Connection, clause: &str, params: P) -> rusqlite::Result<Vec<Self>> {
        let sql = format!("{} {}", Self::select_sql(), clause);
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params, |row| Self::from_row(row))?;
        rows.collect()
    }

    fn query_one<P: Params>(conn: &Connection, clause: &str, params: P) -> rusqlite::Result<Option<Self>> {
        let sql = format!("{} {}", Self::select_sql(), clause);
        conn.query_row(&sql, params, |row| Self::from_row(row)).optional()
    }
}

impl Mapped for Movie {
    const TABLE: &'static str = "movies";
    const COLUMNS: &'static [&'static str] = &[
        "movies.id",
        "movies.year",
        "movies.title",
        "movies.description",
        "movies.hyperlink",
        "movies.rating",
        "movies.voting",
        "movies.running_time",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Movie {
            id: row.get(0)?,
            year: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            hyperlink: row.get(4)?,
            rating: row.get::<_, Option<f64>>(5)?.map(|r| r as f32),
            votes: row.get(6)?,
            runtime_minutes: row.get(7)?,
            director: None,
            actors: Vec::new(),
            genres: Vec::new(),
        })
    }
}

impl Mapped for Genre {
    const TABLE: &'static str = "genres";
    const COLUMNS: &'static [&'static str] = &["genres.name"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Genre::new(row.get::<_, String>(0)?))
    }
}

impl Mapped for Actor {
    const TABLE: &'static str = "actors";
    const COLUMNS: &'static [&'static str] = &["actors.name"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Actor::new(row.get::<_, String>(0)?))
    }
}

impl Mapped for Director {
    const TABLE: &'static str = "directors";
    const COLUMNS: &'static [&'static str] = &["directors.name"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Director::new(row.get::<_, String>(0)?))
    }
}

impl Mapped for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["users.id", "users.username", "users.password"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: Some(row.get(0)?),
            user_name: row.get(1)?,
            password: row.get(2)?,
        })
    }
}

/// Reviews live in `comments`; the author is resolved through `users`.
impl Mapped for Review {
    const TABLE: &'static str = "comments JOIN users ON users.id = comments.user_id";
    const COLUMNS: &'static [&'static str] = &[
        "comments.movie_id",
        "users.username",
        "comments.comment",
        "comments.rating",
        "comments.timestamp",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let user_name: String = row.get(1)?;
        let text: String = row.get(2)?;
        let timestamp = parse_timestamp(row, 4)?;

        Ok(Review::with_timestamp(
            row.get(0)?,
            text,
            row.get(3)?,
            Some(user_name.as_str()),
            timestamp,
        ))
    }
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Timestamp text as stored in `comments.timestamp`
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::open_db_in_memory;
    use rusqlite::params;

    #[test]
    fn select_sql_lists_columns_in_order() {
        assert_eq!(
            User::select_sql(),
            "SELECT users.id, users.username, users.password FROM users"
        );
    }

    #[test]
    fn movie_row_maps_nullable_columns() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO movies (id, year, title, description, rating, voting, running_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![1, 2014, "Guardians of the Galaxy", "Space", 8.1f64, 757074, 121],
        )
        .unwrap();

        let movie = Movie::query_one(&conn, "WHERE movies.id = ?1", [1]).unwrap().unwrap();
        assert_eq!(movie.title, "Guardians of the Galaxy");
        assert_eq!(movie.year, 2014);
        assert_eq!(movie.runtime_minutes, Some(121));
        assert_eq!(movie.hyperlink, None);
        assert!((movie.rating.unwrap() - 8.1).abs() < 1e-6);

        assert!(Movie::query_one(&conn, "WHERE movies.id = ?1", [2]).unwrap().is_none());
    }

    #[test]
    fn review_row_reads_author_and_timestamp() {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, username, password) VALUES (1, 'fmercury', 'x');
             INSERT INTO movies (id, year, title) VALUES (1, 2014, 'Guardians of the Galaxy');
             INSERT INTO comments (user_id, movie_id, comment, rating, timestamp)
             VALUES (1, 1, 'Great', 9, '2020-02-29 08:12:08');",
        )
        .unwrap();

        let reviews = Review::query_all(&conn, "ORDER BY comments.id", []).unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].user_name.as_deref(), Some("fmercury"));
        assert_eq!(reviews[0].rating, Some(9));
        assert_eq!(format_timestamp(&reviews[0].timestamp), "2020-02-29 08:12:08");
    }
}
