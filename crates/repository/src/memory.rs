//! In-memory repository backed by a [`DataSet`].

use crate::error::{RepositoryError, Result};
use crate::password::hash_password;
use crate::traits::{review_author, title_matches, MovieRepository};
use data_loader::{
    normalize_user_name, Actor, DataSet, Director, Genre, Movie, MovieId, Review, User, UserId,
};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Repository that keeps the whole catalogue in process memory.
///
/// Reads take a shared lock, writes an exclusive one.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    data: DataSet,
    /// Keyed by normalized user name
    users: BTreeMap<String, User>,
    next_user_id: UserId,
    reviews: Vec<Review>,
    watch_lists: HashMap<String, Vec<MovieId>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dataset directory and build a repository from it.
    pub fn populate(data_dir: &Path) -> Result<Self> {
        let data = DataSet::load_from_dir(data_dir)?;
        Self::from_dataset(data)
    }

    /// Build a repository from an already loaded dataset.
    ///
    /// Plain-text passwords from the users file are hashed before they are
    /// stored; hashing runs on the rayon pool.
    pub fn from_dataset(data: DataSet) -> Result<Self> {
        let start = Instant::now();

        let users = data
            .users()
            .par_iter()
            .map(|record| {
                Ok(User {
                    id: Some(record.id),
                    user_name: normalize_user_name(&record.user_name),
                    password: hash_password(&record.password)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let reviews = data.reviews();

        let next_user_id = users.iter().filter_map(|u| u.id).max().unwrap_or(0) + 1;
        let users = users
            .into_iter()
            .map(|user| (user.user_name.clone(), user))
            .collect::<BTreeMap<_, _>>();

        info!(
            "Memory repository ready: {} movies, {} users, {} reviews in {:?}",
            data.movies().count(),
            users.len(),
            reviews.len(),
            start.elapsed()
        );

        Ok(Self {
            state: RwLock::new(MemoryState {
                data,
                users,
                next_user_id,
                reviews,
                watch_lists: HashMap::new(),
            }),
        })
    }
}

impl MemoryState {
    fn movies_for(&self, ids: &[MovieId]) -> Vec<Movie> {
        ids.iter()
            .filter_map(|id| self.data.get_movie(*id))
            .cloned()
            .collect()
    }

    fn require_user(&self, user_name: &str) -> Result<String> {
        let key = normalize_user_name(user_name);
        if self.users.contains_key(&key) {
            Ok(key)
        } else {
            Err(RepositoryError::UnknownUser(key))
        }
    }

    fn require_movie(&self, movie_id: MovieId) -> Result<()> {
        match self.data.get_movie(movie_id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::UnknownMovie(movie_id)),
        }
    }
}

impl MovieRepository for MemoryRepository {
    fn add_user(&self, mut user: User) -> Result<()> {
        let mut state = self.state.write();
        let key = normalize_user_name(&user.user_name);
        if state.users.contains_key(&key) {
            return Err(RepositoryError::DuplicateUser(key));
        }

        let id = match user.id {
            Some(id) => id,
            None => state.next_user_id,
        };
        if state.users.values().any(|existing| existing.id == Some(id)) {
            return Err(RepositoryError::DuplicateUserId(id));
        }
        state.next_user_id = state.next_user_id.max(id.saturating_add(1));
        user.id = Some(id);
        user.user_name = key.clone();

        debug!("Added user {} (id {})", key, id);
        state.users.insert(key, user);
        Ok(())
    }

    fn get_user(&self, user_name: &str) -> Result<Option<User>> {
        let state = self.state.read();
        Ok(state.users.get(&normalize_user_name(user_name)).cloned())
    }

    fn add_movie(&self, movie: Movie) -> Result<()> {
        debug!("Adding movie {} ({})", movie.id, movie.title);
        self.state.write().data.insert_movie(movie);
        Ok(())
    }

    fn get_movie(&self, id: MovieId) -> Result<Option<Movie>> {
        Ok(self.state.read().data.get_movie(id).cloned())
    }

    fn get_number_of_movies(&self) -> Result<usize> {
        Ok(self.state.read().data.movies().count())
    }

    fn get_first_movie(&self) -> Result<Option<Movie>> {
        Ok(self.state.read().data.movies().next().cloned())
    }

    fn get_last_movie(&self) -> Result<Option<Movie>> {
        Ok(self.state.read().data.movies().last().cloned())
    }

    fn get_movies_by_year(&self, year: Option<u16>) -> Result<Vec<Movie>> {
        let state = self.state.read();
        Ok(match year {
            Some(year) => state.movies_for(state.data.get_movie_ids_for_year(year)),
            None => state.data.movies().cloned().collect(),
        })
    }

    fn get_movies_by_id(&self, ids: &[MovieId]) -> Result<Vec<Movie>> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let state = self.state.read();
        Ok(state.movies_for(&ids))
    }

    fn get_movies_by_title(&self, title: &str) -> Result<Vec<Movie>> {
        let title = title.trim();
        let state = self.state.read();
        Ok(state
            .data
            .movies()
            .filter(|movie| movie.title == title)
            .cloned()
            .collect())
    }

    fn search_movies(&self, fragment: &str) -> Result<Vec<Movie>> {
        let state = self.state.read();
        Ok(state
            .data
            .movies()
            .filter(|movie| title_matches(&movie.title, fragment))
            .cloned()
            .collect())
    }

    fn add_genre(&self, genre: Genre) -> Result<()> {
        self.state.write().data.add_genre(genre);
        Ok(())
    }

    fn get_genre_list(&self) -> Result<Vec<Genre>> {
        Ok(self.state.read().data.genres().to_vec())
    }

    fn add_actor(&self, actor: Actor) -> Result<()> {
        self.state.write().data.add_actor(actor);
        Ok(())
    }

    fn add_director(&self, director: Director) -> Result<()> {
        self.state.write().data.add_director(director);
        Ok(())
    }

    fn get_year_list(&self) -> Result<Vec<u16>> {
        Ok(self.state.read().data.years().collect())
    }

    fn get_movie_ids_for_genre(&self, genre_name: &str) -> Result<Vec<MovieId>> {
        let state = self.state.read();
        Ok(state.data.get_movie_ids_for_genre(&Genre::new(genre_name)).to_vec())
    }

    fn get_movie_ids_for_year(&self, year: u16) -> Result<Vec<MovieId>> {
        Ok(self.state.read().data.get_movie_ids_for_year(year).to_vec())
    }

    fn get_movies_for_actor(&self, full_name: &str) -> Result<Vec<MovieId>> {
        Ok(self.state.read().data.get_movie_ids_for_actor(full_name).to_vec())
    }

    fn get_movies_for_director(&self, full_name: &str) -> Result<Vec<MovieId>> {
        Ok(self.state.read().data.get_movie_ids_for_director(full_name).to_vec())
    }

    fn get_year_of_previous_movie(&self, movie: &Movie) -> Result<Option<u16>> {
        let state = self.state.read();
        Ok(state.data.years().filter(|year| *year < movie.year).next_back())
    }

    fn get_year_of_next_movie(&self, movie: &Movie) -> Result<Option<u16>> {
        let state = self.state.read();
        Ok(state.data.years().find(|year| *year > movie.year))
    }

    fn add_review(&self, review: Review) -> Result<()> {
        let author = review_author(&review)?;
        let mut state = self.state.write();
        state.require_user(author)?;
        state.require_movie(review.movie_id)?;

        debug!("Added review for movie {} by {}", review.movie_id, author);
        state.reviews.push(review);
        Ok(())
    }

    fn get_reviews(&self) -> Result<Vec<Review>> {
        Ok(self.state.read().reviews.clone())
    }

    fn get_reviews_for_movie(&self, movie_id: MovieId) -> Result<Vec<Review>> {
        let state = self.state.read();
        Ok(state
            .reviews
            .iter()
            .filter(|review| review.movie_id == movie_id)
            .cloned()
            .collect())
    }

    fn add_to_watch_list(&self, user_name: &str, movie_id: MovieId) -> Result<()> {
        let mut state = self.state.write();
        let key = state.require_user(user_name)?;
        state.require_movie(movie_id)?;

        let list = state.watch_lists.entry(key).or_default();
        if !list.contains(&movie_id) {
            list.push(movie_id);
        }
        Ok(())
    }

    fn remove_from_watch_list(&self, user_name: &str, movie_id: MovieId) -> Result<()> {
        let mut state = self.state.write();
        let key = state.require_user(user_name)?;
        if let Some(list) = state.watch_lists.get_mut(&key) {
            list.retain(|id| *id != movie_id);
        }
        Ok(())
    }

    fn get_watch_list(&self, user_name: &str) -> Result<Vec<Movie>> {
        let state = self.state.read();
        let key = state.require_user(user_name)?;
        Ok(state
            .watch_lists
            .get(&key)
            .map(|ids| state.movies_for(ids))
            .unwrap_or_default())
    }
}
