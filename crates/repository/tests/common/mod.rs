//! Behaviour every `MovieRepository` must share, run against both
//! implementations through `repository_behaviour!`.

use data_loader::{Actor, Director, Genre, Movie, Review, User};
use repository::{MovieRepository, RepositoryError, verify_password};
use std::path::PathBuf;

pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

pub fn users_are_found_case_insensitively(repo: &dyn MovieRepository) {
    repo.add_user(User::new("Dave", "123456789")).unwrap();

    let user = repo.get_user("DAVE").unwrap().unwrap();
    assert_eq!(user.user_name, "dave");
    assert!(user.id.is_some());
    assert!(repo.get_user("prince").unwrap().is_none());
}

pub fn duplicate_user_is_rejected(repo: &dyn MovieRepository) {
    assert!(matches!(
        repo.add_user(User::new("THORKE", "other")),
        Err(RepositoryError::DuplicateUser(name)) if name == "thorke"
    ));
}

pub fn explicit_user_id_must_be_free(repo: &dyn MovieRepository) {
    let mut user = User::new("impostor", "pw");
    user.id = Some(1);
    assert!(matches!(
        repo.add_user(user),
        Err(RepositoryError::DuplicateUserId(1))
    ));
    assert!(repo.get_user("impostor").unwrap().is_none());
    assert_eq!(repo.get_user("thorke").unwrap().unwrap().id, Some(1));
}

pub fn loaded_passwords_are_hashed(repo: &dyn MovieRepository) {
    let user = repo.get_user("thorke").unwrap().unwrap();
    assert_ne!(user.password, "cLQ^C#oFXloS");
    assert!(verify_password("cLQ^C#oFXloS", &user.password));
}

pub fn movie_counts_and_bounds(repo: &dyn MovieRepository) {
    assert_eq!(repo.get_number_of_movies().unwrap(), 13);
    assert_eq!(repo.get_first_movie().unwrap().unwrap().title, "Guardians of the Galaxy");
    assert_eq!(repo.get_last_movie().unwrap().unwrap().title, "Inception");
}

pub fn movie_carries_relationships(repo: &dyn MovieRepository) {
    let movie = repo.get_movie(1).unwrap().unwrap();

    assert_eq!(movie.year, 2014);
    assert_eq!(movie.director, Some(Director::new("James Gunn")));
    assert_eq!(
        movie.genres,
        vec![Genre::new("Action"), Genre::new("Adventure"), Genre::new("Sci-Fi")]
    );
    assert_eq!(movie.actors.len(), 4);
    assert_eq!(movie.actors[0], Actor::new("Chris Pratt"));
    assert_eq!(movie.runtime_minutes, Some(121));
    assert!(repo.get_movie(999).unwrap().is_none());
}

pub fn adding_a_movie_registers_it(repo: &dyn MovieRepository) {
    let mut movie = Movie::new(500, "Arrival", 2016).unwrap();
    movie.add_genre(Genre::new("Sci-Fi"));
    movie.director = Some(Director::new("Denis Villeneuve"));
    repo.add_movie(movie).unwrap();

    assert_eq!(repo.get_number_of_movies().unwrap(), 14);
    assert_eq!(repo.get_last_movie().unwrap().unwrap().title, "Arrival");
    assert_eq!(repo.get_movies_for_director("Denis Villeneuve").unwrap(), vec![500]);
    assert_eq!(repo.get_movie_ids_for_genre("Sci-Fi").unwrap(), vec![1, 2, 65, 81, 500]);
}

pub fn movies_by_year(repo: &dyn MovieRepository) {
    let titles: Vec<String> = repo
        .get_movies_by_year(Some(2016))
        .unwrap()
        .into_iter()
        .map(|m| m.title)
        .collect();
    assert_eq!(titles.len(), 8);
    assert_eq!(titles[0], "Split");

    assert!(repo.get_movies_by_year(Some(1988)).unwrap().is_empty());
    assert_eq!(repo.get_movies_by_year(None).unwrap().len(), 13);
}

pub fn movies_by_id_skip_unknown(repo: &dyn MovieRepository) {
    let ids: Vec<u32> = repo
        .get_movies_by_id(&[81, 2, 999, 2])
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![2, 81]);
    assert!(repo.get_movies_by_id(&[]).unwrap().is_empty());
}

pub fn title_lookup_and_search(repo: &dyn MovieRepository) {
    let exact = repo.get_movies_by_title("The Prestige").unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].id, 65);
    assert!(repo.get_movies_by_title("the prestige").unwrap().is_empty());

    let found: Vec<u32> = repo
        .search_movies("THE")
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(found, vec![1, 6, 9, 55, 65]);
    assert!(repo.search_movies("zzz").unwrap().is_empty());

    repo.add_movie(Movie::new(600, "Amélie", 2001).unwrap()).unwrap();
    for fragment in ["AMÉLIE", "amélie", "mÉl"] {
        let found: Vec<u32> = repo
            .search_movies(fragment)
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(found, vec![600], "searching {fragment}");
    }
}

pub fn genre_list_keeps_first_seen_order(repo: &dyn MovieRepository) {
    let genres = repo.get_genre_list().unwrap();
    assert_eq!(genres.len(), 15);
    assert_eq!(genres[0], Genre::new("Action"));
    assert_eq!(genres[3], Genre::new("Mystery"));
    assert_eq!(genres[14], Genre::new("Crime"));

    repo.add_genre(Genre::new("Western")).unwrap();
    repo.add_genre(Genre::new("Action")).unwrap();
    let genres = repo.get_genre_list().unwrap();
    assert_eq!(genres.len(), 16);
    assert_eq!(genres[15], Genre::new("Western"));
}

pub fn standalone_people_do_not_create_movies(repo: &dyn MovieRepository) {
    repo.add_actor(Actor::new("Tom Hardy")).unwrap();
    repo.add_director(Director::new("George Miller")).unwrap();

    assert!(repo.get_movies_for_actor("Tom Hardy").unwrap().is_empty());
    assert!(repo.get_movies_for_director("George Miller").unwrap().is_empty());
    assert_eq!(repo.get_number_of_movies().unwrap(), 13);
}

pub fn year_list_and_neighbours(repo: &dyn MovieRepository) {
    assert_eq!(
        repo.get_year_list().unwrap(),
        vec![2006, 2008, 2010, 2012, 2014, 2016]
    );

    let split = repo.get_movie(3).unwrap().unwrap();
    assert_eq!(repo.get_year_of_previous_movie(&split).unwrap(), Some(2014));
    assert_eq!(repo.get_year_of_next_movie(&split).unwrap(), None);

    let prestige = repo.get_movie(65).unwrap().unwrap();
    assert_eq!(repo.get_year_of_previous_movie(&prestige).unwrap(), None);
    assert_eq!(repo.get_year_of_next_movie(&prestige).unwrap(), Some(2008));
}

pub fn id_lookups_by_category(repo: &dyn MovieRepository) {
    assert_eq!(repo.get_movie_ids_for_genre("Action").unwrap(), vec![1, 5, 6, 9, 55, 81]);
    assert_eq!(repo.get_movie_ids_for_genre("Drama").unwrap(), vec![7, 10, 55, 65]);
    assert!(repo.get_movie_ids_for_genre("Western").unwrap().is_empty());
    assert_eq!(repo.get_movie_ids_for_year(2014).unwrap(), vec![1]);
    assert_eq!(repo.get_movies_for_actor("Chris Pratt").unwrap(), vec![1, 10]);
    assert_eq!(repo.get_movies_for_actor("Scarlett Johansson").unwrap(), vec![4, 65]);
    assert_eq!(
        repo.get_movies_for_director("Christopher Nolan").unwrap(),
        vec![55, 65, 81]
    );
}

pub fn movies_by_category(repo: &dyn MovieRepository) {
    let bale: Vec<u32> = repo
        .get_movies_by_actor(&Actor::new("Christian Bale"))
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(bale, vec![55, 65]);

    let crime = repo.get_movies_by_genre(&Genre::new("Crime")).unwrap();
    assert_eq!(crime.len(), 1);
    assert_eq!(crime[0].title, "The Dark Knight");

    let gunn = repo.get_movies_by_director(&Director::new("James Gunn")).unwrap();
    assert_eq!(gunn[0].id, 1);
}

pub fn loaded_reviews_are_available(repo: &dyn MovieRepository) {
    assert_eq!(repo.get_reviews().unwrap().len(), 3);

    let reviews = repo.get_reviews_for_movie(1).unwrap();
    assert_eq!(reviews.len(), 3);
    assert_eq!(reviews[0].user_name.as_deref(), Some("fmercury"));
    assert_eq!(reviews[0].review_text, "Oh no, COVID-19 has hit New Zealand");
    assert_eq!(reviews[0].rating, None);
    assert!(repo.get_reviews_for_movie(2).unwrap().is_empty());
}

pub fn review_validation(repo: &dyn MovieRepository) {
    assert!(matches!(
        repo.add_review(Review::new(2, "Nobody wrote this", 5, None)),
        Err(RepositoryError::MissingUser)
    ));
    assert!(matches!(
        repo.add_review(Review::new(2, "Who am I", 5, Some("ghost"))),
        Err(RepositoryError::UnknownUser(_))
    ));
    assert!(matches!(
        repo.add_review(Review::new(999, "Lost", 5, Some("thorke"))),
        Err(RepositoryError::UnknownMovie(999))
    ));

    repo.add_review(Review::new(2, "Creepy and beautiful", 8, Some("Thorke")))
        .unwrap();
    let reviews = repo.get_reviews_for_movie(2).unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].rating, Some(8));
    assert_eq!(reviews[0].user_name.as_deref(), Some("thorke"));
    assert_eq!(repo.get_reviews().unwrap().len(), 4);
}

pub fn watch_list_round_trip(repo: &dyn MovieRepository) {
    repo.add_to_watch_list("mjackson", 81).unwrap();
    repo.add_to_watch_list("mjackson", 3).unwrap();
    repo.add_to_watch_list("MJackson", 81).unwrap();

    let ids: Vec<u32> = repo
        .get_watch_list("mjackson")
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![81, 3]);

    repo.remove_from_watch_list("mjackson", 81).unwrap();
    repo.remove_from_watch_list("mjackson", 999).unwrap();
    assert_eq!(repo.get_watch_list("mjackson").unwrap().len(), 1);
    assert!(repo.get_watch_list("thorke").unwrap().is_empty());

    assert!(matches!(
        repo.add_to_watch_list("mjackson", 999),
        Err(RepositoryError::UnknownMovie(999))
    ));
    assert!(matches!(
        repo.get_watch_list("ghost"),
        Err(RepositoryError::UnknownUser(_))
    ));
}

/// Expand one `#[test]` per shared behaviour for a populated repository
/// built by `$make`.
macro_rules! repository_behaviour {
    (@tests $make:expr; $($name:ident),* $(,)?) => {
        $(
            #[test]
            fn $name() {
                let repo = $make;
                common::$name(&repo);
            }
        )*
    };
    ($make:expr) => {
        repository_behaviour!(@tests $make;
            users_are_found_case_insensitively,
            duplicate_user_is_rejected,
            explicit_user_id_must_be_free,
            loaded_passwords_are_hashed,
            movie_counts_and_bounds,
            movie_carries_relationships,
            adding_a_movie_registers_it,
            movies_by_year,
            movies_by_id_skip_unknown,
            title_lookup_and_search,
            genre_list_keeps_first_seen_order,
            standalone_people_do_not_create_movies,
            year_list_and_neighbours,
            id_lookups_by_category,
            movies_by_category,
            loaded_reviews_are_available,
            review_validation,
            watch_list_round_trip,
        );
    };
}
