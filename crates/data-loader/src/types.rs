//! Core domain types for the movie catalogue.
//!
//! Every entity compares by its natural key rather than by all of its fields:
//! a movie is identified by `(title, year)`, a genre/actor/director by name and
//! a user by lower-cased user name. The derived-looking trait impls below are
//! written by hand for exactly that reason.

use crate::error::{DataLoadError, Result};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a movie (the `Rank` column of the dataset)
pub type MovieId = u32;

/// Unique identifier for a user (the `id` column of users.csv)
pub type UserId = u32;

/// Earliest release year a movie may carry
pub const MIN_YEAR: u16 = 1900;

/// Format used for review timestamps in comments.csv and in the database
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// People and categories
// =============================================================================

/// A movie genre, compared by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
}

impl Genre {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
        }
    }
}

/// A movie director, compared by full name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Director {
    pub full_name: String,
}

impl Director {
    pub fn new(full_name: impl AsRef<str>) -> Self {
        Self {
            full_name: full_name.as_ref().trim().to_string(),
        }
    }
}

/// An actor. Equality and ordering only look at `full_name`; `colleagues`
/// is derived data built while reading the dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub full_name: String,
    /// Names of actors who appeared in at least one movie with this one
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub colleagues: BTreeSet<String>,
}

impl Actor {
    pub fn new(full_name: impl AsRef<str>) -> Self {
        Self {
            full_name: full_name.as_ref().trim().to_string(),
            colleagues: BTreeSet::new(),
        }
    }

    /// Record that `colleague` shared a movie with this actor.
    pub fn add_colleague(&mut self, colleague: &Actor) {
        if colleague.full_name != self.full_name {
            self.colleagues.insert(colleague.full_name.clone());
        }
    }

    pub fn worked_with(&self, other: &Actor) -> bool {
        self.colleagues.contains(&other.full_name)
    }
}

impl PartialEq for Actor {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name
    }
}

impl Eq for Actor {}

impl Hash for Actor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_name.hash(state);
    }
}

impl PartialOrd for Actor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Actor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.full_name.cmp(&other.full_name)
    }
}

// =============================================================================
// Movie
// =============================================================================

/// A movie in the catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub year: u16,
    pub description: String,
    pub director: Option<Director>,
    pub actors: Vec<Actor>,
    pub genres: Vec<Genre>,
    pub runtime_minutes: Option<u32>,
    /// IMDb-style rating out of 10
    pub rating: Option<f32>,
    pub votes: Option<u32>,
    pub hyperlink: Option<String>,
}

impl Movie {
    /// Build a movie with only its identifying fields set.
    ///
    /// Rejects blank titles and years before [`MIN_YEAR`].
    pub fn new(id: MovieId, title: impl AsRef<str>, year: u16) -> Result<Self> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return Err(DataLoadError::InvalidValue {
                field: "title".to_string(),
                value: String::new(),
            });
        }
        if year < MIN_YEAR {
            return Err(DataLoadError::InvalidValue {
                field: "year".to_string(),
                value: year.to_string(),
            });
        }

        Ok(Self {
            id,
            title: title.to_string(),
            year,
            description: String::new(),
            director: None,
            actors: Vec::new(),
            genres: Vec::new(),
            runtime_minutes: None,
            rating: None,
            votes: None,
            hyperlink: None,
        })
    }

    pub fn is_genred_by(&self, genre: &Genre) -> bool {
        self.genres.contains(genre)
    }

    /// Add a genre unless an equal one is already attached.
    pub fn add_genre(&mut self, genre: Genre) {
        if !self.is_genred_by(&genre) {
            self.genres.push(genre);
        }
    }

    pub fn remove_genre(&mut self, genre: &Genre) {
        self.genres.retain(|g| g != genre);
    }

    pub fn is_played_by(&self, actor: &Actor) -> bool {
        self.actors.contains(actor)
    }

    /// Add an actor unless an equal one is already attached.
    pub fn add_actor(&mut self, actor: Actor) {
        if !self.is_played_by(&actor) {
            self.actors.push(actor);
        }
    }

    pub fn remove_actor(&mut self, actor: &Actor) {
        self.actors.retain(|a| a != actor);
    }
}

impl PartialEq for Movie {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.year == other.year
    }
}

impl Eq for Movie {}

impl Hash for Movie {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
        self.year.hash(state);
    }
}

impl PartialOrd for Movie {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Movie {
    fn cmp(&self, other: &Self) -> Ordering {
        self.title
            .cmp(&other.title)
            .then_with(|| self.year.cmp(&other.year))
    }
}

// =============================================================================
// Users and reviews
// =============================================================================

/// A registered user. `password` holds whatever the caller stored, which is
/// a PHC hash string everywhere outside of tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<UserId>,
    pub user_name: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl User {
    pub fn new(user_name: impl AsRef<str>, password: impl Into<String>) -> Self {
        Self {
            id: None,
            user_name: normalize_user_name(user_name.as_ref()),
            password: password.into(),
        }
    }
}

/// User names are matched case-insensitively
pub fn normalize_user_name(user_name: &str) -> String {
    user_name.trim().to_lowercase()
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.user_name == other.user_name
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user_name.hash(state);
    }
}

impl PartialOrd for User {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for User {
    fn cmp(&self, other: &Self) -> Ordering {
        self.user_name.cmp(&other.user_name)
    }
}

/// A review (comment) left on a movie.
///
/// `user_name` may be `None` so callers can build a review before knowing the
/// author; repositories refuse to store such reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub movie_id: MovieId,
    pub user_name: Option<String>,
    pub review_text: String,
    /// Rating in `1..=10`; out-of-range input is dropped to `None`
    pub rating: Option<u8>,
    pub timestamp: NaiveDateTime,
}

impl Review {
    /// Create a review stamped with the current time (whole seconds).
    pub fn new(
        movie_id: MovieId,
        review_text: impl AsRef<str>,
        rating: u8,
        user_name: Option<&str>,
    ) -> Self {
        Self::with_timestamp(
            movie_id,
            review_text,
            Some(rating),
            user_name,
            Utc::now().naive_utc().trunc_subsecs(0),
        )
    }

    pub fn with_timestamp(
        movie_id: MovieId,
        review_text: impl AsRef<str>,
        rating: Option<u8>,
        user_name: Option<&str>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            movie_id,
            user_name: user_name.map(normalize_user_name),
            review_text: review_text.as_ref().trim().to_string(),
            rating: rating.filter(|r| (1..=10).contains(r)),
            timestamp,
        }
    }
}

impl PartialEq for Review {
    fn eq(&self, other: &Self) -> bool {
        self.movie_id == other.movie_id
            && self.review_text == other.review_text
            && self.rating == other.rating
            && self.timestamp == other.timestamp
    }
}

impl Eq for Review {}

// =============================================================================
// Raw records from users.csv / comments.csv
// =============================================================================

/// One row of users.csv; the password is still plain text here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub user_name: String,
    pub password: String,
}

/// One row of comments.csv
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: u32,
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub comment: String,
    pub timestamp: NaiveDateTime,
}

// =============================================================================
// DataSet - the parsed domain graph
// =============================================================================

/// Everything read from a dataset directory, with lookup indices.
///
/// Movies are keyed by id so iteration is always in ascending id order.
/// Genres keep the order in which they were first seen in the file.
#[derive(Debug, Default)]
pub struct DataSet {
    pub(crate) movies: BTreeMap<MovieId, Movie>,
    pub(crate) genres: Vec<Genre>,
    pub(crate) actors: BTreeMap<String, Actor>,
    pub(crate) directors: BTreeMap<String, Director>,

    // Secondary indices: name -> ascending movie ids
    pub(crate) genre_index: HashMap<Genre, Vec<MovieId>>,
    pub(crate) actor_index: HashMap<String, Vec<MovieId>>,
    pub(crate) director_index: HashMap<String, Vec<MovieId>>,
    pub(crate) year_index: BTreeMap<u16, Vec<MovieId>>,

    pub(crate) users: Vec<UserRecord>,
    pub(crate) comments: Vec<CommentRecord>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Movies in ascending id order
    pub fn movies(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    /// Distinct genres in first-seen order
    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    /// Distinct actors ordered by name, colleagues filled in
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn get_actor(&self, full_name: &str) -> Option<&Actor> {
        self.actors.get(full_name.trim())
    }

    /// Distinct directors ordered by name
    pub fn directors(&self) -> impl Iterator<Item = &Director> {
        self.directors.values()
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn comments(&self) -> &[CommentRecord] {
        &self.comments
    }

    pub fn get_movie_ids_for_genre(&self, genre: &Genre) -> &[MovieId] {
        self.genre_index
            .get(genre)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_movie_ids_for_actor(&self, full_name: &str) -> &[MovieId] {
        self.actor_index
            .get(full_name.trim())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_movie_ids_for_director(&self, full_name: &str) -> &[MovieId] {
        self.director_index
            .get(full_name.trim())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_movie_ids_for_year(&self, year: u16) -> &[MovieId] {
        self.year_index
            .get(&year)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Insert a movie and fold its genres, actors and director into the
    /// deduplicated collections and indices.
    ///
    /// Re-inserting an id replaces the previous movie's index entries.
    pub fn insert_movie(&mut self, movie: Movie) {
        if self.movies.contains_key(&movie.id) {
            self.unindex_movie(movie.id);
        }
        let id = movie.id;

        for genre in &movie.genres {
            if !self.genres.contains(genre) {
                self.genres.push(genre.clone());
            }
            insert_sorted(self.genre_index.entry(genre.clone()).or_default(), id);
        }

        for actor in &movie.actors {
            let entry = self
                .actors
                .entry(actor.full_name.clone())
                .or_insert_with(|| Actor::new(&actor.full_name));
            for colleague in &movie.actors {
                entry.add_colleague(colleague);
            }
            insert_sorted(self.actor_index.entry(actor.full_name.clone()).or_default(), id);
        }

        if let Some(director) = &movie.director {
            self.directors
                .entry(director.full_name.clone())
                .or_insert_with(|| director.clone());
            insert_sorted(
                self.director_index.entry(director.full_name.clone()).or_default(),
                id,
            );
        }

        insert_sorted(self.year_index.entry(movie.year).or_default(), id);
        self.movies.insert(id, movie);
    }

    fn unindex_movie(&mut self, id: MovieId) {
        let indices = self
            .genre_index
            .values_mut()
            .chain(self.actor_index.values_mut())
            .chain(self.director_index.values_mut())
            .chain(self.year_index.values_mut());
        for ids in indices {
            ids.retain(|&existing| existing != id);
        }
    }

    /// Register a genre that no movie carries yet. Returns false if known.
    pub fn add_genre(&mut self, genre: Genre) -> bool {
        if self.genres.contains(&genre) {
            return false;
        }
        self.genres.push(genre);
        true
    }

    pub fn add_actor(&mut self, actor: Actor) -> bool {
        if self.actors.contains_key(&actor.full_name) {
            return false;
        }
        self.actors.insert(actor.full_name.clone(), actor);
        true
    }

    pub fn add_director(&mut self, director: Director) -> bool {
        if self.directors.contains_key(&director.full_name) {
            return false;
        }
        self.directors.insert(director.full_name.clone(), director);
        true
    }

    /// Release years that currently have at least one movie, ascending
    pub fn years(&self) -> impl DoubleEndedIterator<Item = u16> + '_ {
        self.year_index
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(year, _)| *year)
    }

    pub fn insert_user(&mut self, user: UserRecord) {
        self.users.push(user);
    }

    pub fn insert_comment(&mut self, comment: CommentRecord) {
        self.comments.push(comment);
    }

    /// (movies, genres, actors, directors) counts for logging/validation
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.movies.len(),
            self.genres.len(),
            self.actors.len(),
            self.directors.len(),
        )
    }
}

fn insert_sorted(ids: &mut Vec<MovieId>, id: MovieId) {
    if let Err(pos) = ids.binary_search(&id) {
        ids.insert(pos, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_equality_uses_title_and_year() {
        let mut a = Movie::new(1, "Moana", 2016).unwrap();
        let b = Movie::new(2, " Moana ", 2016).unwrap();
        a.description = "different".to_string();

        assert_eq!(a, b);
        assert_ne!(a, Movie::new(1, "Moana", 2015).unwrap());
    }

    #[test]
    fn movie_ordering_is_title_then_year() {
        let a = Movie::new(1, "Alien", 1979).unwrap();
        let b = Movie::new(2, "Alien", 1986).unwrap();
        let c = Movie::new(3, "Brazil", 1985).unwrap();

        let mut movies = vec![c.clone(), b.clone(), a.clone()];
        movies.sort();
        assert_eq!(movies, vec![a, b, c]);
    }

    #[test]
    fn movie_rejects_blank_title_and_early_year() {
        assert!(Movie::new(1, "   ", 2000).is_err());
        assert!(Movie::new(1, "Metropolis", 1899).is_err());
    }

    #[test]
    fn genres_and_actors_are_deduplicated_on_movie() {
        let mut movie = Movie::new(1, "Heat", 1995).unwrap();
        movie.add_genre(Genre::new("Crime"));
        movie.add_genre(Genre::new(" Crime"));
        movie.add_actor(Actor::new("Al Pacino"));
        movie.add_actor(Actor::new("Al Pacino "));

        assert_eq!(movie.genres.len(), 1);
        assert_eq!(movie.actors.len(), 1);
        assert!(movie.is_genred_by(&Genre::new("Crime")));

        movie.remove_genre(&Genre::new("Crime"));
        assert!(movie.genres.is_empty());
    }

    #[test]
    fn actor_equality_ignores_colleagues() {
        let mut a = Actor::new("Chris Pratt");
        a.add_colleague(&Actor::new("Zoe Saldana"));
        a.add_colleague(&Actor::new("Chris Pratt"));

        assert_eq!(a, Actor::new("Chris Pratt"));
        assert!(a.worked_with(&Actor::new("Zoe Saldana")));
        assert_eq!(a.colleagues.len(), 1);
    }

    #[test]
    fn user_names_are_lower_cased() {
        let user = User::new("  Dave ", "123456789");
        assert_eq!(user.user_name, "dave");
        assert_eq!(user, User::new("DAVE", "other"));
    }

    #[test]
    fn review_rating_out_of_range_is_dropped() {
        let review = Review::new(1, "  Great ", 11, Some("Dave"));
        assert_eq!(review.rating, None);
        assert_eq!(review.review_text, "Great");
        assert_eq!(review.user_name.as_deref(), Some("dave"));
        assert_eq!(review.timestamp.and_utc().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn insert_movie_builds_indices() {
        let mut data = DataSet::new();

        let mut first = Movie::new(2, "Prometheus", 2012).unwrap();
        first.add_genre(Genre::new("Sci-Fi"));
        first.add_actor(Actor::new("Noomi Rapace"));
        first.add_actor(Actor::new("Michael Fassbender"));
        first.director = Some(Director::new("Ridley Scott"));

        let mut second = Movie::new(1, "Guardians of the Galaxy", 2014).unwrap();
        second.add_genre(Genre::new("Action"));
        second.add_genre(Genre::new("Sci-Fi"));

        data.insert_movie(first);
        data.insert_movie(second);

        assert_eq!(data.genres(), &[Genre::new("Sci-Fi"), Genre::new("Action")]);
        assert_eq!(data.get_movie_ids_for_genre(&Genre::new("Sci-Fi")), &[1, 2]);
        assert_eq!(data.get_movie_ids_for_director("Ridley Scott"), &[2]);
        assert_eq!(data.get_movie_ids_for_year(2014), &[1]);
        assert!(
            data.get_actor("Noomi Rapace")
                .unwrap()
                .worked_with(&Actor::new("Michael Fassbender"))
        );
        assert_eq!(data.movies().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn reinserting_a_movie_replaces_its_index_entries() {
        let mut data = DataSet::new();
        let mut movie = Movie::new(7, "La La Land", 2016).unwrap();
        movie.add_genre(Genre::new("Comedy"));
        data.insert_movie(movie.clone());

        movie.remove_genre(&Genre::new("Comedy"));
        movie.add_genre(Genre::new("Music"));
        data.insert_movie(movie);

        assert!(data.get_movie_ids_for_genre(&Genre::new("Comedy")).is_empty());
        assert_eq!(data.get_movie_ids_for_genre(&Genre::new("Music")), &[7]);
        assert_eq!(data.get_movie_ids_for_year(2016), &[7]);
    }

    #[test]
    fn years_skip_emptied_entries() {
        let mut data = DataSet::new();
        let mut movie = Movie::new(3, "Split", 2015).unwrap();
        data.insert_movie(movie.clone());
        data.insert_movie(Movie::new(4, "Sing", 2016).unwrap());

        movie.year = 2016;
        data.insert_movie(movie);

        assert_eq!(data.years().collect::<Vec<_>>(), vec![2016]);
    }

    #[test]
    fn standalone_genres_and_people_are_registered_once() {
        let mut data = DataSet::new();

        assert!(data.add_genre(Genre::new("Western")));
        assert!(!data.add_genre(Genre::new("Western")));
        assert!(data.add_actor(Actor::new("Tom Hardy")));
        assert!(!data.add_actor(Actor::new("Tom Hardy")));
        assert!(data.add_director(Director::new("Denis Villeneuve")));
        assert_eq!(data.counts(), (0, 1, 1, 1));
    }
}
