//! Browsing: home page, years, genres, people, search and movie detail.

use super::views::{summaries, GenreLink, GenrePage, HomePage, MovieDetail, MovieSummary, PersonMovies, YearPage};
use super::{blocking, Result, ServiceError, SharedRepository};
use data_loader::{Actor, Director, MovieId};
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

/// Movies featured on the home page
pub const HOME_MOVIE_COUNT: usize = 3;
pub const DEFAULT_PAGE_SIZE: usize = 3;
pub const MAX_PAGE_SIZE: usize = 50;

pub async fn get_genre_names(repo: &SharedRepository) -> Result<Vec<String>> {
    let genres = blocking(repo, |repo| repo.get_genre_list()).await?;
    Ok(genres.into_iter().map(|g| g.name).collect())
}

pub async fn get_genre_links(repo: &SharedRepository) -> Result<Vec<GenreLink>> {
    let genres = blocking(repo, |repo| repo.get_genre_list()).await?;
    Ok(genres.iter().map(GenreLink::from).collect())
}

pub async fn get_years(repo: &SharedRepository) -> Result<Vec<u16>> {
    blocking(repo, |repo| repo.get_year_list()).await
}

/// Up to `quantity` distinct movies picked uniformly among the stored ids.
pub async fn get_random_movies(repo: &SharedRepository, quantity: usize) -> Result<Vec<MovieSummary>> {
    let movies = blocking(repo, move |repo| {
        let mut ids: Vec<MovieId> = Vec::new();
        for year in repo.get_year_list()? {
            ids.extend(repo.get_movie_ids_for_year(year)?);
        }
        let chosen: Vec<MovieId> = ids
            .choose_multiple(&mut rand::rng(), quantity)
            .copied()
            .collect();
        repo.get_movies_by_id(&chosen)
    })
    .await?;

    Ok(summaries(&movies))
}

/// Random selection and genre links, fetched concurrently
pub async fn home_page(repo: &SharedRepository) -> Result<HomePage> {
    let (selected_movies, genres) = tokio::join!(
        get_random_movies(repo, HOME_MOVIE_COUNT),
        get_genre_links(repo)
    );

    Ok(HomePage {
        selected_movies: selected_movies?,
        genres: genres?,
    })
}

/// Movies of `year`, or of the first movie's year when none is given.
pub async fn movies_by_year(repo: &SharedRepository, year: Option<u16>) -> Result<YearPage> {
    blocking(repo, move |repo| {
        let year = match year {
            Some(year) => Some(year),
            None => repo.get_first_movie()?.map(|movie| movie.year),
        };
        let Some(year) = year else {
            return Ok(YearPage {
                year: None,
                movies: Vec::new(),
                previous_year: None,
                next_year: None,
            });
        };

        let movies = repo.get_movies_by_year(Some(year))?;
        let (previous_year, next_year) = match movies.first() {
            Some(first) => (
                repo.get_year_of_previous_movie(first)?,
                repo.get_year_of_next_movie(first)?,
            ),
            None => {
                let years = repo.get_year_list()?;
                (
                    years.iter().copied().filter(|y| *y < year).next_back(),
                    years.iter().copied().find(|y| *y > year),
                )
            }
        };

        debug!("Year {} has {} movies", year, movies.len());
        Ok(YearPage {
            year: Some(year),
            movies: summaries(&movies),
            previous_year,
            next_year,
        })
    })
    .await
}

/// One page of a genre, `page_size` movies starting at offset `cursor`.
pub async fn movies_by_genre(
    repo: &SharedRepository,
    genre: String,
    cursor: usize,
    page_size: usize,
) -> Result<GenrePage> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        warn!("Rejected page size {}", page_size);
        return Err(ServiceError::Validation(format!(
            "Page size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    blocking(repo, move |repo| {
        let ids = repo.get_movie_ids_for_genre(&genre)?;
        let total = ids.len();
        let page: Vec<MovieId> = ids.iter().skip(cursor).take(page_size).copied().collect();
        let movies = repo.get_movies_by_id(&page)?;

        let previous_cursor = (cursor > 0).then(|| cursor.saturating_sub(page_size));
        let next = cursor.saturating_add(page_size);
        let next_cursor = (next < total).then_some(next);
        let last_page = total.saturating_sub(1) / page_size * page_size;

        Ok(GenrePage {
            genre,
            movies: summaries(&movies),
            total,
            cursor,
            page_size,
            first_cursor: previous_cursor.map(|_| 0),
            previous_cursor,
            next_cursor,
            last_cursor: next_cursor.map(|_| last_page),
        })
    })
    .await
}

pub async fn movies_for_actor(repo: &SharedRepository, name: String) -> Result<PersonMovies> {
    blocking(repo, move |repo| {
        let movies = repo.get_movies_by_actor(&Actor::new(&name))?;
        Ok(PersonMovies {
            name,
            movies: summaries(&movies),
        })
    })
    .await
}

pub async fn movies_for_director(repo: &SharedRepository, name: String) -> Result<PersonMovies> {
    blocking(repo, move |repo| {
        let movies = repo.get_movies_by_director(&Director::new(&name))?;
        Ok(PersonMovies {
            name,
            movies: summaries(&movies),
        })
    })
    .await
}

pub async fn search_movies(repo: &SharedRepository, title: String) -> Result<Vec<MovieSummary>> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("Search text must not be empty".to_string()));
    }
    let movies = blocking(repo, move |repo| repo.search_movies(&title)).await?;
    Ok(summaries(&movies))
}

/// Full movie with its reviews
pub async fn get_movie(repo: &SharedRepository, id: MovieId) -> Result<MovieDetail> {
    let found = blocking(repo, move |repo| match repo.get_movie(id)? {
        Some(movie) => {
            let reviews = repo.get_reviews_for_movie(id)?;
            Ok(Some(MovieDetail::new(&movie, &reviews)))
        }
        None => Ok(None),
    })
    .await?;

    found.ok_or(ServiceError::MovieNotFound(id))
}
