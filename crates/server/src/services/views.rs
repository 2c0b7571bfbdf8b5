//! JSON shapes handed to the web layer.

use data_loader::{Genre, Movie, MovieId, Review, TIMESTAMP_FORMAT};
use serde::{Deserialize, Serialize};

/// Compact movie card used by every list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    pub year: u16,
    pub description: String,
    pub rating: Option<f32>,
    pub votes: Option<u32>,
    pub url: String,
}

impl From<&Movie> for MovieSummary {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            year: movie.year,
            description: movie.description.clone(),
            rating: movie.rating,
            votes: movie.votes,
            url: movie_url(movie.id),
        }
    }
}

pub fn summaries(movies: &[Movie]) -> Vec<MovieSummary> {
    movies.iter().map(MovieSummary::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreLink {
    pub name: String,
    pub url: String,
}

impl From<&Genre> for GenreLink {
    fn from(genre: &Genre) -> Self {
        Self {
            name: genre.name.clone(),
            url: format!("/movies/genre/{}", urlencoding::encode(&genre.name)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewView {
    pub user_name: Option<String>,
    pub review_text: String,
    pub rating: Option<u8>,
    pub timestamp: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            user_name: review.user_name.clone(),
            review_text: review.review_text.clone(),
            rating: review.rating,
            timestamp: review.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: MovieId,
    pub title: String,
    pub year: u16,
    pub description: String,
    pub director: Option<String>,
    pub actors: Vec<String>,
    pub genres: Vec<GenreLink>,
    pub runtime_minutes: Option<u32>,
    pub rating: Option<f32>,
    pub votes: Option<u32>,
    pub hyperlink: Option<String>,
    pub reviews: Vec<ReviewView>,
}

impl MovieDetail {
    pub fn new(movie: &Movie, reviews: &[Review]) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            year: movie.year,
            description: movie.description.clone(),
            director: movie.director.as_ref().map(|d| d.full_name.clone()),
            actors: movie.actors.iter().map(|a| a.full_name.clone()).collect(),
            genres: movie.genres.iter().map(GenreLink::from).collect(),
            runtime_minutes: movie.runtime_minutes,
            rating: movie.rating,
            votes: movie.votes,
            hyperlink: movie.hyperlink.clone(),
            reviews: reviews.iter().map(ReviewView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomePage {
    pub selected_movies: Vec<MovieSummary>,
    pub genres: Vec<GenreLink>,
}

/// Movies of one release year with links to the neighbouring years
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearPage {
    pub year: Option<u16>,
    pub movies: Vec<MovieSummary>,
    pub previous_year: Option<u16>,
    pub next_year: Option<u16>,
}

/// One page of a genre listing. Cursors are offsets into the genre's
/// ascending id list; absent cursors mean there is nowhere to go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenrePage {
    pub genre: String,
    pub movies: Vec<MovieSummary>,
    pub total: usize,
    pub cursor: usize,
    pub page_size: usize,
    pub first_cursor: Option<usize>,
    pub previous_cursor: Option<usize>,
    pub next_cursor: Option<usize>,
    pub last_cursor: Option<usize>,
}

/// Movies an actor played in, or a director directed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonMovies {
    pub name: String,
    pub movies: Vec<MovieSummary>,
}

pub fn movie_url(id: MovieId) -> String {
    format!("/movies/{id}")
}
