//! Parsers for the dataset files.
//!
//! - movie file (e.g. Data1000Movies.csv):
//!   `Rank,Title,Genre,Description,Director,Actors,Year,Runtime (Minutes),Rating,Votes,Revenue (Millions),Metascore`
//! - users.csv: `id,username,password`
//! - comments.csv: `id,user_id,movie_id,comment,timestamp`
//!
//! All files are UTF-8 with a header row; a leading BOM is tolerated and every
//! field is trimmed. `Genre` and `Actors` are comma separated lists inside a
//! single quoted field.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Read a whole file as text, dropping a UTF-8 byte order mark if present.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; the dataset is
/// scraped text and the odd mangled character should not fail a load.
fn read_text(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content = String::from_utf8_lossy(&bytes);
    Ok(content
        .strip_prefix('\u{feff}')
        .unwrap_or(&content)
        .to_string())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Deserialize every record of `content` into `T`, tagging failures with the
/// file name and line number.
fn read_records<T: DeserializeOwned>(content: &str, file: &str) -> Result<Vec<(usize, T)>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let csv_error = |source| DataLoadError::Csv {
        file: file.to_string(),
        source,
    };
    let headers = reader.headers().map_err(csv_error)?.clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let row = record
            .deserialize::<T>(Some(&headers))
            .map_err(|e| DataLoadError::ParseError {
                file: file.to_string(),
                line,
                reason: e.to_string(),
            })?;
        records.push((line, row));
    }
    Ok(records)
}

// =============================================================================
// Movies
// =============================================================================

#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(rename = "Rank")]
    rank: MovieId,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Genre")]
    genre: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Director", default)]
    director: String,
    #[serde(rename = "Actors", default)]
    actors: String,
    #[serde(rename = "Year")]
    year: u16,
    #[serde(rename = "Runtime (Minutes)", default)]
    runtime_minutes: Option<u32>,
    #[serde(rename = "Rating", default)]
    rating: Option<f32>,
    #[serde(rename = "Votes", default)]
    votes: Option<u32>,
}

/// Parse the movie dataset file
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let content = read_text(path)?;
    parse_movies_str(&content, &file_label(path))
}

/// Parse movie rows from already-loaded CSV text
pub fn parse_movies_str(content: &str, file: &str) -> Result<Vec<Movie>> {
    let rows = read_records::<MovieRow>(content, file)?;
    let mut movies = Vec::with_capacity(rows.len());

    for (line, row) in rows {
        let mut movie = Movie::new(row.rank, &row.title, row.year).map_err(|e| {
            DataLoadError::ParseError {
                file: file.to_string(),
                line,
                reason: e.to_string(),
            }
        })?;

        movie.description = row.description;
        movie.runtime_minutes = row.runtime_minutes;
        movie.rating = row.rating;
        movie.votes = row.votes;

        for genre in split_list(&row.genre) {
            movie.add_genre(Genre::new(genre));
        }
        for actor in split_list(&row.actors) {
            movie.add_actor(Actor::new(actor));
        }
        if !row.director.is_empty() {
            movie.director = Some(Director::new(&row.director));
        }

        movies.push(movie);
    }

    Ok(movies)
}

/// Split a comma separated list field, trimming and skipping empty entries
///
/// Example: "Action, Adventure,,Sci-Fi" -> ["Action", "Adventure", "Sci-Fi"]
fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|item| !item.is_empty())
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserRow {
    id: UserId,
    username: String,
    password: String,
}

/// Parse users.csv
pub fn parse_users(path: &Path) -> Result<Vec<UserRecord>> {
    let content = read_text(path)?;
    parse_users_str(&content, &file_label(path))
}

pub fn parse_users_str(content: &str, file: &str) -> Result<Vec<UserRecord>> {
    let rows = read_records::<UserRow>(content, file)?;
    rows.into_iter()
        .map(|(line, row)| {
            let user_name = normalize_user_name(&row.username);
            if user_name.is_empty() {
                return Err(DataLoadError::ParseError {
                    file: file.to_string(),
                    line,
                    reason: "Missing username".to_string(),
                });
            }
            Ok(UserRecord {
                id: row.id,
                user_name,
                password: row.password,
            })
        })
        .collect()
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Deserialize)]
struct CommentRow {
    id: u32,
    user_id: UserId,
    movie_id: MovieId,
    comment: String,
    timestamp: String,
}

/// Parse comments.csv
pub fn parse_comments(path: &Path) -> Result<Vec<CommentRecord>> {
    let content = read_text(path)?;
    parse_comments_str(&content, &file_label(path))
}

pub fn parse_comments_str(content: &str, file: &str) -> Result<Vec<CommentRecord>> {
    let rows = read_records::<CommentRow>(content, file)?;
    rows.into_iter()
        .map(|(line, row)| {
            let timestamp = parse_timestamp(&row.timestamp).map_err(|e| {
                DataLoadError::ParseError {
                    file: file.to_string(),
                    line,
                    reason: format!("Invalid timestamp: {}", e),
                }
            })?;
            Ok(CommentRecord {
                id: row.id,
                user_id: row.user_id,
                movie_id: row.movie_id,
                comment: row.comment,
                timestamp,
            })
        })
        .collect()
}

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp
pub fn parse_timestamp(s: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
}
