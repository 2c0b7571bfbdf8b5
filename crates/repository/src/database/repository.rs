//! SQLite implementation of [`MovieRepository`].

use super::mapping::{format_timestamp, Mapped};
use super::open::{open_db, open_db_in_memory};
use crate::error::{RepositoryError, Result};
use crate::traits::{review_author, title_matches, MovieRepository};
use data_loader::{
    normalize_user_name, Actor, Director, Genre, Movie, MovieId, Review, User,
};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Params, Transaction};
use std::path::Path;
use tracing::debug;

/// Repository persisting the catalogue in a SQLite database.
///
/// The connection sits behind a mutex; every write runs in its own
/// transaction so a failed operation leaves no partial rows behind.
pub struct DatabaseRepository {
    conn: Mutex<Connection>,
}

impl DatabaseRepository {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// True when no movie has been stored yet
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.get_number_of_movies()? == 0)
    }

    /// Delete every row, keeping the schema.
    pub fn clear(&self) -> Result<()> {
        self.with_transaction(|tx| {
            tx.execute_batch(
                "DELETE FROM watch_lists;
                 DELETE FROM comments;
                 DELETE FROM movie_actors;
                 DELETE FROM movie_genres;
                 DELETE FROM movies;
                 DELETE FROM actors;
                 DELETE FROM genres;
                 DELETE FROM directors;
                 DELETE FROM users;",
            )?;
            Ok(())
        })
    }

    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run `f` in a transaction; it is rolled back if `f` fails.
    pub(crate) fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

// =============================================================================
// Row-level helpers shared with population
// =============================================================================

/// Insert a name into `genres`, `actors` or `directors` if missing and return its id
pub(crate) fn upsert_name(conn: &Connection, table: &str, name: &str) -> Result<i64> {
    conn.prepare_cached(&format!(
        "INSERT INTO {table} (name) VALUES (?1) ON CONFLICT(name) DO NOTHING"
    ))?
    .execute([name])?;

    let id = conn
        .prepare_cached(&format!("SELECT id FROM {table} WHERE name = ?1"))?
        .query_row([name], |row| row.get(0))?;
    Ok(id)
}

/// Insert or replace a movie together with its relationships.
pub(crate) fn store_movie(conn: &Connection, movie: &Movie) -> Result<()> {
    let director_id = match &movie.director {
        Some(director) => Some(upsert_name(conn, "directors", &director.full_name)?),
        None => None,
    };

    conn.prepare_cached(
        "INSERT INTO movies (id, year, title, description, hyperlink, rating, voting, running_time, director_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            year = excluded.year,
            title = excluded.title,
            description = excluded.description,
            hyperlink = excluded.hyperlink,
            rating = excluded.rating,
            voting = excluded.voting,
            running_time = excluded.running_time,
            director_id = excluded.director_id",
    )?
    .execute(params![
        movie.id,
        movie.year,
        movie.title,
        movie.description,
        movie.hyperlink,
        movie.rating.map(f64::from),
        movie.votes,
        movie.runtime_minutes,
        director_id,
    ])?;

    conn.execute("DELETE FROM movie_genres WHERE movie_id = ?1", [movie.id])?;
    conn.execute("DELETE FROM movie_actors WHERE movie_id = ?1", [movie.id])?;

    for genre in &movie.genres {
        let genre_id = upsert_name(conn, "genres", &genre.name)?;
        conn.prepare_cached("INSERT OR IGNORE INTO movie_genres (movie_id, genre_id) VALUES (?1, ?2)")?
            .execute(params![movie.id, genre_id])?;
    }
    for actor in &movie.actors {
        let actor_id = upsert_name(conn, "actors", &actor.full_name)?;
        conn.prepare_cached("INSERT OR IGNORE INTO movie_actors (movie_id, actor_id) VALUES (?1, ?2)")?
            .execute(params![movie.id, actor_id])?;
    }
    Ok(())
}

/// Insert a user, keeping its id when one is set.
pub(crate) fn insert_user(conn: &Connection, user: &User) -> Result<()> {
    let name = normalize_user_name(&user.user_name);
    if find_user_id(conn, &name)?.is_some() {
        return Err(RepositoryError::DuplicateUser(name));
    }
    if let Some(id) = user.id {
        let taken = conn
            .prepare_cached("SELECT 1 FROM users WHERE id = ?1")?
            .exists([id])?;
        if taken {
            return Err(RepositoryError::DuplicateUserId(id));
        }
    }
    conn.prepare_cached("INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)")?
        .execute(params![user.id, name, user.password])?;
    Ok(())
}

pub(crate) fn insert_review(conn: &Connection, user_id: i64, review: &Review) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO comments (user_id, movie_id, comment, rating, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?
    .execute(params![
        user_id,
        review.movie_id,
        review.review_text,
        review.rating,
        format_timestamp(&review.timestamp),
    ])?;
    Ok(())
}

fn find_user_id(conn: &Connection, user_name: &str) -> Result<Option<i64>> {
    let id = conn
        .prepare_cached("SELECT id FROM users WHERE username = ?1")?
        .query_row([normalize_user_name(user_name)], |row| row.get(0))
        .optional()?;
    Ok(id)
}

fn require_user_id(conn: &Connection, user_name: &str) -> Result<i64> {
    find_user_id(conn, user_name)?
        .ok_or_else(|| RepositoryError::UnknownUser(normalize_user_name(user_name)))
}

fn require_movie(conn: &Connection, movie_id: MovieId) -> Result<()> {
    let exists = conn
        .prepare_cached("SELECT 1 FROM movies WHERE id = ?1")?
        .exists([movie_id])?;
    if exists {
        Ok(())
    } else {
        Err(RepositoryError::UnknownMovie(movie_id))
    }
}

/// Attach director, actors and genres to a movie read from `movies`
fn load_relations(conn: &Connection, movie: &mut Movie) -> Result<()> {
    movie.director = Director::query_one(
        conn,
        "JOIN movies ON movies.director_id = directors.id WHERE movies.id = ?1",
        [movie.id],
    )?;
    movie.genres = Genre::query_all(
        conn,
        "JOIN movie_genres ON movie_genres.genre_id = genres.id
         WHERE movie_genres.movie_id = ?1 ORDER BY movie_genres.id",
        [movie.id],
    )?;
    movie.actors = Actor::query_all(
        conn,
        "JOIN movie_actors ON movie_actors.actor_id = actors.id
         WHERE movie_actors.movie_id = ?1 ORDER BY movie_actors.id",
        [movie.id],
    )?;
    Ok(())
}

fn find_movies<P: Params>(conn: &Connection, clause: &str, params: P) -> Result<Vec<Movie>> {
    let mut movies = Movie::query_all(conn, clause, params)?;
    for movie in &mut movies {
        load_relations(conn, movie)?;
    }
    Ok(movies)
}

fn find_movie<P: Params>(conn: &Connection, clause: &str, params: P) -> Result<Option<Movie>> {
    match Movie::query_one(conn, clause, params)? {
        Some(mut movie) => {
            load_relations(conn, &mut movie)?;
            Ok(Some(movie))
        }
        None => Ok(None),
    }
}

fn query_ids<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<MovieId>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let ids = stmt
        .query_map(params, |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<MovieId>>>()?;
    Ok(ids)
}

impl MovieRepository for DatabaseRepository {
    fn add_user(&self, user: User) -> Result<()> {
        debug!("Adding user {}", user.user_name);
        self.with_transaction(|tx| insert_user(tx, &user))
    }

    fn get_user(&self, user_name: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            Ok(User::query_one(
                conn,
                "WHERE users.username = ?1",
                [normalize_user_name(user_name)],
            )?)
        })
    }

    fn add_movie(&self, movie: Movie) -> Result<()> {
        debug!("Adding movie {} ({})", movie.id, movie.title);
        self.with_transaction(|tx| store_movie(tx, &movie))
    }

    fn get_movie(&self, id: MovieId) -> Result<Option<Movie>> {
        self.with_conn(|conn| find_movie(conn, "WHERE movies.id = ?1", [id]))
    }

    fn get_number_of_movies(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    fn get_first_movie(&self) -> Result<Option<Movie>> {
        self.with_conn(|conn| find_movie(conn, "ORDER BY movies.id ASC LIMIT 1", []))
    }

    fn get_last_movie(&self) -> Result<Option<Movie>> {
        self.with_conn(|conn| find_movie(conn, "ORDER BY movies.id DESC LIMIT 1", []))
    }

    fn get_movies_by_year(&self, year: Option<u16>) -> Result<Vec<Movie>> {
        self.with_conn(|conn| match year {
            Some(year) => find_movies(conn, "WHERE movies.year = ?1 ORDER BY movies.id", [year]),
            None => find_movies(conn, "ORDER BY movies.id", []),
        })
    }

    fn get_movies_by_id(&self, ids: &[MovieId]) -> Result<Vec<Movie>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let placeholders = vec!["?"; ids.len()].join(", ");
        let clause = format!("WHERE movies.id IN ({placeholders}) ORDER BY movies.id");
        self.with_conn(|conn| find_movies(conn, &clause, params_from_iter(ids.iter())))
    }

    fn get_movies_by_title(&self, title: &str) -> Result<Vec<Movie>> {
        self.with_conn(|conn| {
            find_movies(conn, "WHERE movies.title = ?1 ORDER BY movies.id", [title.trim()])
        })
    }

    fn search_movies(&self, fragment: &str) -> Result<Vec<Movie>> {
        // SQLite's lower() only folds ASCII, so titles are matched here
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached("SELECT id, title FROM movies ORDER BY id")?;
            let titles = stmt
                .query_map([], |row| Ok((row.get::<_, MovieId>(0)?, row.get::<_, String>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut movies = Vec::new();
            for (id, title) in titles {
                if title_matches(&title, fragment) {
                    if let Some(movie) = find_movie(conn, "WHERE movies.id = ?1", [id])? {
                        movies.push(movie);
                    }
                }
            }
            Ok(movies)
        })
    }

    fn add_genre(&self, genre: Genre) -> Result<()> {
        self.with_transaction(|tx| upsert_name(tx, "genres", &genre.name).map(|_| ()))
    }

    fn get_genre_list(&self) -> Result<Vec<Genre>> {
        self.with_conn(|conn| Ok(Genre::query_all(conn, "ORDER BY genres.id", [])?))
    }

    fn add_actor(&self, actor: Actor) -> Result<()> {
        self.with_transaction(|tx| upsert_name(tx, "actors", &actor.full_name).map(|_| ()))
    }

    fn add_director(&self, director: Director) -> Result<()> {
        self.with_transaction(|tx| upsert_name(tx, "directors", &director.full_name).map(|_| ()))
    }

    fn get_year_list(&self) -> Result<Vec<u16>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached("SELECT DISTINCT year FROM movies ORDER BY year")?;
            let years = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<u16>>>()?;
            Ok(years)
        })
    }

    fn get_movie_ids_for_genre(&self, genre_name: &str) -> Result<Vec<MovieId>> {
        self.with_conn(|conn| {
            query_ids(
                conn,
                "SELECT movie_genres.movie_id FROM movie_genres
                 JOIN genres ON genres.id = movie_genres.genre_id
                 WHERE genres.name = ?1 ORDER BY movie_genres.movie_id",
                [genre_name.trim()],
            )
        })
    }

    fn get_movie_ids_for_year(&self, year: u16) -> Result<Vec<MovieId>> {
        self.with_conn(|conn| {
            query_ids(conn, "SELECT id FROM movies WHERE year = ?1 ORDER BY id", [year])
        })
    }

    fn get_movies_for_actor(&self, full_name: &str) -> Result<Vec<MovieId>> {
        self.with_conn(|conn| {
            query_ids(
                conn,
                "SELECT movie_actors.movie_id FROM movie_actors
                 JOIN actors ON actors.id = movie_actors.actor_id
                 WHERE actors.name = ?1 ORDER BY movie_actors.movie_id",
                [full_name.trim()],
            )
        })
    }

    fn get_movies_for_director(&self, full_name: &str) -> Result<Vec<MovieId>> {
        self.with_conn(|conn| {
            query_ids(
                conn,
                "SELECT movies.id FROM movies
                 JOIN directors ON directors.id = movies.director_id
                 WHERE directors.name = ?1 ORDER BY movies.id",
                [full_name.trim()],
            )
        })
    }

    fn get_year_of_previous_movie(&self, movie: &Movie) -> Result<Option<u16>> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT MAX(year) FROM movies WHERE year < ?1",
                [movie.year],
                |row| row.get(0),
            )?)
        })
    }

    fn get_year_of_next_movie(&self, movie: &Movie) -> Result<Option<u16>> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT MIN(year) FROM movies WHERE year > ?1",
                [movie.year],
                |row| row.get(0),
            )?)
        })
    }

    fn add_review(&self, review: Review) -> Result<()> {
        let author = review_author(&review)?;
        self.with_transaction(|tx| {
            let user_id = require_user_id(tx, author)?;
            require_movie(tx, review.movie_id)?;
            insert_review(tx, user_id, &review)
        })?;
        debug!("Added review for movie {} by {}", review.movie_id, author);
        Ok(())
    }

    fn get_reviews(&self) -> Result<Vec<Review>> {
        self.with_conn(|conn| Ok(Review::query_all(conn, "ORDER BY comments.id", [])?))
    }

    fn get_reviews_for_movie(&self, movie_id: MovieId) -> Result<Vec<Review>> {
        self.with_conn(|conn| {
            Ok(Review::query_all(
                conn,
                "WHERE comments.movie_id = ?1 ORDER BY comments.id",
                [movie_id],
            )?)
        })
    }

    fn add_to_watch_list(&self, user_name: &str, movie_id: MovieId) -> Result<()> {
        self.with_transaction(|tx| {
            let user_id = require_user_id(tx, user_name)?;
            require_movie(tx, movie_id)?;
            tx.execute(
                "INSERT OR IGNORE INTO watch_lists (user_id, movie_id) VALUES (?1, ?2)",
                params![user_id, movie_id],
            )?;
            Ok(())
        })
    }

    fn remove_from_watch_list(&self, user_name: &str, movie_id: MovieId) -> Result<()> {
        self.with_transaction(|tx| {
            let user_id = require_user_id(tx, user_name)?;
            tx.execute(
                "DELETE FROM watch_lists WHERE user_id = ?1 AND movie_id = ?2",
                params![user_id, movie_id],
            )?;
            Ok(())
        })
    }

    fn get_watch_list(&self, user_name: &str) -> Result<Vec<Movie>> {
        self.with_conn(|conn| {
            let user_id = require_user_id(conn, user_name)?;
            find_movies(
                conn,
                "JOIN watch_lists ON watch_lists.movie_id = movies.id
                 WHERE watch_lists.user_id = ?1 ORDER BY watch_lists.id",
                [user_id],
            )
        })
    }
}
