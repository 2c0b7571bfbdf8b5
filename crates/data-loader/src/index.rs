//! DataSet building and validation.
//!
//! Ties the parsers together: read the three dataset files, fold the movies
//! into the deduplicated domain graph and check that every comment points at a
//! user and a movie that actually exist.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Default file name of the movie dataset inside a data directory
pub const MOVIES_FILE: &str = "Data1000Movies.csv";
pub const USERS_FILE: &str = "users.csv";
pub const COMMENTS_FILE: &str = "comments.csv";

impl DataSet {
    /// Load a full dataset directory (movies, users and comments).
    ///
    /// The three files are parsed in parallel with rayon, then folded into a
    /// `DataSet` and validated.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading movie dataset from {:?}", data_dir);

        let movies_path = data_dir.join(MOVIES_FILE);
        let users_path = data_dir.join(USERS_FILE);
        let comments_path = data_dir.join(COMMENTS_FILE);

        let (movies, (users, comments)) = rayon::join(
            || parser::parse_movies(&movies_path),
            || {
                rayon::join(
                    || parser::parse_users(&users_path),
                    || parser::parse_comments(&comments_path),
                )
            },
        );
        let movies = movies?;
        let users = users?;
        let comments = comments?;

        let mut data = DataSet::from_movies(movies);
        for user in users {
            data.insert_user(user);
        }
        for comment in comments {
            data.insert_comment(comment);
        }

        data.validate()?;

        let (movies, genres, actors, directors) = data.counts();
        info!(
            "Loaded {} movies, {} genres, {} actors, {} directors, {} users, {} comments",
            movies,
            genres,
            actors,
            directors,
            data.users.len(),
            data.comments.len()
        );
        Ok(data)
    }

    /// Load only a movie file; the result has no users or comments.
    pub fn load_movie_file(path: &Path) -> Result<Self> {
        let movies = parser::parse_movies(path)?;
        Ok(DataSet::from_movies(movies))
    }

    pub fn from_movies(movies: Vec<Movie>) -> Self {
        let mut data = DataSet::new();
        for movie in movies {
            data.insert_movie(movie);
        }
        data
    }

    /// Check referential integrity of users and comments:
    /// - user ids and user names are unique
    /// - every comment references an existing user and movie
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for user in &self.users {
            if !ids.insert(user.id) {
                return Err(DataLoadError::InvalidValue {
                    field: "user id".to_string(),
                    value: user.id.to_string(),
                });
            }
            if !names.insert(user.user_name.as_str()) {
                return Err(DataLoadError::InvalidValue {
                    field: "username".to_string(),
                    value: user.user_name.clone(),
                });
            }
        }

        for comment in &self.comments {
            if !ids.contains(&comment.user_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "User".to_string(),
                    id: comment.user_id,
                });
            }
            if !self.movies.contains_key(&comment.movie_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Movie".to_string(),
                    id: comment.movie_id,
                });
            }
        }
        Ok(())
    }

    /// Look up the user record a comment belongs to
    pub fn user_for_comment(&self, comment: &CommentRecord) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id == comment.user_id)
    }

    /// Convert the raw comments into reviews. Comments carry no rating.
    pub fn reviews(&self) -> Vec<Review> {
        self.comments
            .iter()
            .map(|comment| {
                let author = self.user_for_comment(comment).map(|u| u.user_name.as_str());
                Review::with_timestamp(comment.movie_id, &comment.comment, None, author, comment.timestamp)
            })
            .collect()
    }
}
