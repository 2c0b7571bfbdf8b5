//! The storage-agnostic repository contract.
//!
//! Both the in-memory and the SQLite repository implement [`MovieRepository`],
//! and the web layer only ever talks to a `dyn MovieRepository`.

use crate::error::{RepositoryError, Result};
use data_loader::{Actor, Director, Genre, Movie, MovieId, Review, User};

/// Query and mutation operations over the movie catalogue.
///
/// Implementations use interior mutability so a single instance can be
/// shared across request handlers behind an `Arc`.
///
/// Ordering guarantees shared by every implementation:
/// - movie lists returned for ids, genres, actors, directors and years are
///   in ascending id order
/// - genres keep the order in which they were first added
/// - years are ascending
pub trait MovieRepository: Send + Sync {
    // ---- users ----

    /// Store a new user. Fails with `DuplicateUser` if the name is taken.
    fn add_user(&self, user: User) -> Result<()>;

    /// Look up a user by name, case-insensitively
    fn get_user(&self, user_name: &str) -> Result<Option<User>>;

    // ---- movies ----

    /// Store a movie, replacing any movie with the same id. Its genres,
    /// actors and director are registered as a side effect.
    fn add_movie(&self, movie: Movie) -> Result<()>;

    fn get_movie(&self, id: MovieId) -> Result<Option<Movie>>;

    fn get_number_of_movies(&self) -> Result<usize>;

    /// Movie with the lowest id
    fn get_first_movie(&self) -> Result<Option<Movie>>;

    /// Movie with the highest id
    fn get_last_movie(&self) -> Result<Option<Movie>>;

    /// Movies released in `year`; `None` means every movie
    fn get_movies_by_year(&self, year: Option<u16>) -> Result<Vec<Movie>>;

    /// The movies among `ids` that exist; unknown ids are skipped
    fn get_movies_by_id(&self, ids: &[MovieId]) -> Result<Vec<Movie>>;

    /// Movies whose title matches exactly
    fn get_movies_by_title(&self, title: &str) -> Result<Vec<Movie>>;

    /// Movies whose title contains `fragment`, ignoring case
    fn search_movies(&self, fragment: &str) -> Result<Vec<Movie>>;

    // ---- genres, actors, directors, years ----

    fn add_genre(&self, genre: Genre) -> Result<()>;

    fn get_genre_list(&self) -> Result<Vec<Genre>>;

    fn add_actor(&self, actor: Actor) -> Result<()>;

    fn add_director(&self, director: Director) -> Result<()>;

    /// Distinct release years, ascending
    fn get_year_list(&self) -> Result<Vec<u16>>;

    fn get_movie_ids_for_genre(&self, genre_name: &str) -> Result<Vec<MovieId>>;

    fn get_movie_ids_for_year(&self, year: u16) -> Result<Vec<MovieId>>;

    fn get_movies_for_actor(&self, full_name: &str) -> Result<Vec<MovieId>>;

    fn get_movies_for_director(&self, full_name: &str) -> Result<Vec<MovieId>>;

    fn get_movies_by_genre(&self, genre: &Genre) -> Result<Vec<Movie>> {
        let ids = self.get_movie_ids_for_genre(&genre.name)?;
        self.get_movies_by_id(&ids)
    }

    fn get_movies_by_actor(&self, actor: &Actor) -> Result<Vec<Movie>> {
        let ids = self.get_movies_for_actor(&actor.full_name)?;
        self.get_movies_by_id(&ids)
    }

    fn get_movies_by_director(&self, director: &Director) -> Result<Vec<Movie>> {
        let ids = self.get_movies_for_director(&director.full_name)?;
        self.get_movies_by_id(&ids)
    }

    /// Closest release year strictly before `movie.year`
    fn get_year_of_previous_movie(&self, movie: &Movie) -> Result<Option<u16>>;

    /// Closest release year strictly after `movie.year`
    fn get_year_of_next_movie(&self, movie: &Movie) -> Result<Option<u16>>;

    // ---- reviews ----

    /// Store a review. The author must be set and registered, and the
    /// reviewed movie must exist.
    fn add_review(&self, review: Review) -> Result<()>;

    /// All reviews in insertion order
    fn get_reviews(&self) -> Result<Vec<Review>>;

    /// Reviews of one movie in insertion order
    fn get_reviews_for_movie(&self, movie_id: MovieId) -> Result<Vec<Review>>;

    // ---- watch lists ----

    /// Add a movie to a user's watch list; adding twice is a no-op
    fn add_to_watch_list(&self, user_name: &str, movie_id: MovieId) -> Result<()>;

    /// Remove a movie from a user's watch list; removing an absent movie is a no-op
    fn remove_from_watch_list(&self, user_name: &str, movie_id: MovieId) -> Result<()>;

    /// Watch list movies in the order they were added
    fn get_watch_list(&self, user_name: &str) -> Result<Vec<Movie>>;
}

/// Author of a review that is about to be stored
pub(crate) fn review_author(review: &Review) -> Result<&str> {
    review
        .user_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or(RepositoryError::MissingUser)
}

/// Case-insensitive substring match used by title search
pub(crate) fn title_matches(title: &str, fragment: &str) -> bool {
    title.to_lowercase().contains(&fragment.trim().to_lowercase())
}
