//! Registration, login, reviews and watch lists.

use super::views::{summaries, MovieSummary, ReviewView};
use super::{blocking, Result, ServiceError, SharedRepository};
use data_loader::{normalize_user_name, MovieId, Review, User};
use repository::{hash_password, verify_password};
use tracing::{info, warn};

pub const MIN_USER_NAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 7;
pub const MIN_REVIEW_LEN: usize = 4;

pub fn validate_user_name(user_name: &str) -> Result<()> {
    if user_name.trim().chars().count() < MIN_USER_NAME_LEN {
        return Err(ServiceError::Validation(format!(
            "User name must be at least {MIN_USER_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Passwords need seven characters with an upper-case letter, a lower-case
/// letter and a digit.
pub fn validate_password(password: &str) -> Result<()> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters and contain an upper case letter, a lower case letter and a digit"
        )))
    }
}

/// Create an account; the password is hashed before it is stored.
pub async fn register(repo: &SharedRepository, user_name: String, password: String) -> Result<String> {
    validate_user_name(&user_name)?;
    validate_password(&password)?;

    let user_name = normalize_user_name(&user_name);
    let name = user_name.clone();
    blocking(repo, move |repo| {
        let hash = hash_password(&password)?;
        repo.add_user(User::new(&name, hash))
    })
    .await?;

    info!("Registered user {}", user_name);
    Ok(user_name)
}

/// Check credentials and return the normalized user name.
pub async fn authenticate(repo: &SharedRepository, user_name: String, password: String) -> Result<String> {
    let user_name = normalize_user_name(&user_name);
    let name = user_name.clone();
    let verified = blocking(repo, move |repo| {
        Ok(match repo.get_user(&name)? {
            Some(user) => verify_password(&password, &user.password),
            None => false,
        })
    })
    .await?;

    if verified {
        Ok(user_name)
    } else {
        warn!("Failed login for {}", user_name);
        Err(ServiceError::AuthenticationFailed)
    }
}

pub async fn get_user(repo: &SharedRepository, user_name: String) -> Result<User> {
    let lookup = user_name.clone();
    blocking(repo, move |repo| repo.get_user(&lookup))
        .await?
        .ok_or(ServiceError::UnknownUser(user_name))
}

/// Post a review as `user_name`. Text is trimmed and must keep at least
/// four characters; the rating must be in `1..=10`.
pub async fn add_review(
    repo: &SharedRepository,
    movie_id: MovieId,
    review_text: String,
    rating: u8,
    user_name: String,
) -> Result<ReviewView> {
    if review_text.trim().chars().count() < MIN_REVIEW_LEN {
        return Err(ServiceError::Validation(format!(
            "Review must be at least {MIN_REVIEW_LEN} characters"
        )));
    }
    if !(1..=10).contains(&rating) {
        return Err(ServiceError::Validation("Rating must be between 1 and 10".to_string()));
    }

    let review = Review::new(movie_id, &review_text, rating, Some(user_name.as_str()));
    let view = ReviewView::from(&review);
    blocking(repo, move |repo| repo.add_review(review)).await?;

    info!("{} reviewed movie {}", user_name, movie_id);
    Ok(view)
}

pub async fn get_reviews_for_movie(repo: &SharedRepository, movie_id: MovieId) -> Result<Vec<ReviewView>> {
    let reviews = blocking(repo, move |repo| {
        if repo.get_movie(movie_id)?.is_none() {
            return Err(repository::RepositoryError::UnknownMovie(movie_id));
        }
        repo.get_reviews_for_movie(movie_id)
    })
    .await?;
    Ok(reviews.iter().map(ReviewView::from).collect())
}

pub async fn get_watch_list(repo: &SharedRepository, user_name: String) -> Result<Vec<MovieSummary>> {
    let movies = blocking(repo, move |repo| repo.get_watch_list(&user_name)).await?;
    Ok(summaries(&movies))
}

/// Add a movie and return the updated watch list
pub async fn add_to_watch_list(
    repo: &SharedRepository,
    user_name: String,
    movie_id: MovieId,
) -> Result<Vec<MovieSummary>> {
    let movies = blocking(repo, move |repo| {
        repo.add_to_watch_list(&user_name, movie_id)?;
        repo.get_watch_list(&user_name)
    })
    .await?;
    Ok(summaries(&movies))
}

/// Remove a movie and return the updated watch list
pub async fn remove_from_watch_list(
    repo: &SharedRepository,
    user_name: String,
    movie_id: MovieId,
) -> Result<Vec<MovieSummary>> {
    let movies = blocking(repo, move |repo| {
        repo.remove_from_watch_list(&user_name, movie_id)?;
        repo.get_watch_list(&user_name)
    })
    .await?;
    Ok(summaries(&movies))
}
