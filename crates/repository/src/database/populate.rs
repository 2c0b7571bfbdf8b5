//! Bulk loading of a dataset into the database.

use super::mapping::format_timestamp;
use super::repository::{insert_user, store_movie, upsert_name, DatabaseRepository};
use crate::error::Result;
use crate::password::hash_password;
use data_loader::{DataSet, User};
use rayon::prelude::*;
use rusqlite::params;
use std::path::Path;
use std::time::Instant;
use tracing::info;

impl DatabaseRepository {
    /// Load a dataset directory and store all of it.
    pub fn populate_from_dir(&self, data_dir: &Path) -> Result<()> {
        let data = DataSet::load_from_dir(data_dir)?;
        self.populate_data(&data)?;
        self.populate_users(&data)
    }

    /// Store genres, movies, directors and actors in one transaction.
    ///
    /// Genres are written first so their ids follow the order in which the
    /// dataset first mentions them.
    pub fn populate_data(&self, data: &DataSet) -> Result<()> {
        let start = Instant::now();
        let stored = self.with_transaction(|tx| {
            for genre in data.genres() {
                upsert_name(tx, "genres", &genre.name)?;
            }
            let mut stored = 0usize;
            for movie in data.movies() {
                store_movie(tx, movie)?;
                stored += 1;
            }
            for director in data.directors() {
                upsert_name(tx, "directors", &director.full_name)?;
            }
            for actor in data.actors() {
                upsert_name(tx, "actors", &actor.full_name)?;
            }
            Ok(stored)
        })?;

        info!("Stored {} movies in {:?}", stored, start.elapsed());
        Ok(())
    }

    /// Store users (with hashed passwords) and their comments.
    pub fn populate_users(&self, data: &DataSet) -> Result<()> {
        let start = Instant::now();

        // Hash outside the connection lock
        let users = data
            .users()
            .par_iter()
            .map(|record| {
                Ok(User {
                    id: Some(record.id),
                    user_name: record.user_name.clone(),
                    password: hash_password(&record.password)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.with_transaction(|tx| {
            for user in &users {
                insert_user(tx, user)?;
            }
            let mut stmt = tx.prepare_cached(
                "INSERT INTO comments (id, user_id, movie_id, comment, rating, timestamp)
                 VALUES (?1, ?2, ?3, ?4, NULL, ?5)",
            )?;
            for comment in data.comments() {
                stmt.execute(params![
                    comment.id,
                    comment.user_id,
                    comment.movie_id,
                    comment.comment,
                    format_timestamp(&comment.timestamp),
                ])?;
            }
            Ok(())
        })?;

        info!(
            "Stored {} users and {} comments in {:?}",
            users.len(),
            data.comments().len(),
            start.elapsed()
        );
        Ok(())
    }
}
