use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use server::{AppState, ServerConfig, build_router, config::RepositoryKind};
use std::path::PathBuf;
use tower::ServiceExt;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

fn app_with(config: &ServerConfig) -> Router {
    let repo = config.open_repository().unwrap();
    build_router(AppState::new(repo))
}

fn app() -> Router {
    app_with(&ServerConfig::memory(data_dir()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn login(app: &Router, user_name: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "user_name": user_name, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn ids(movies: &Value) -> Vec<u64> {
    movies
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn home_page_has_three_movies_and_all_genres() {
    let (status, body) = get(&app(), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_movies"].as_array().unwrap().len(), 3);
    assert_eq!(body["genres"].as_array().unwrap().len(), 15);
    assert_eq!(body["genres"][2]["url"], "/movies/genre/Sci-Fi");
}

#[tokio::test]
async fn years_are_ascending() {
    let (_, body) = get(&app(), "/years").await;
    assert_eq!(body, json!([2006, 2008, 2010, 2012, 2014, 2016]));
}

#[tokio::test]
async fn browse_by_year_with_neighbours() {
    let (status, body) = get(&app(), "/movies?year=2012").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["movies"]), vec![2]);
    assert_eq!(body["previous_year"], 2010);
    assert_eq!(body["next_year"], 2014);
}

#[tokio::test]
async fn genre_pages_default_to_three_movies() {
    let app = app();
    let (_, first) = get(&app, "/movies/genre/Drama").await;
    assert_eq!(ids(&first["movies"]), vec![7, 10, 55]);
    assert_eq!(first["next_cursor"], 3);

    let (_, second) = get(&app, "/movies/genre/Drama?cursor=3").await;
    assert_eq!(ids(&second["movies"]), vec![65]);
    assert_eq!(second["next_cursor"], Value::Null);
    assert_eq!(second["previous_cursor"], 0);

    let (status, _) = get(&app, "/movies/genre/Drama?page_size=500").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn people_and_search() {
    let app = app();
    let (_, actor) = get(&app, "/movies/actor/Christian%20Bale").await;
    assert_eq!(ids(&actor["movies"]), vec![55, 65]);

    let (_, director) = get(&app, "/movies/director/Christopher%20Nolan").await;
    assert_eq!(ids(&director["movies"]), vec![55, 65, 81]);

    let (_, found) = get(&app, "/movies/search?title=galaxy").await;
    assert_eq!(ids(&found), vec![1]);
}

#[tokio::test]
async fn movie_detail_and_missing_movie() {
    let app = app();
    let (status, body) = get(&app, "/movies/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["director"], "James Gunn");
    assert_eq!(body["runtime_minutes"], 121);
    assert_eq!(body["reviews"].as_array().unwrap().len(), 3);
    assert_eq!(body["reviews"][0]["user_name"], "fmercury");

    let (status, body) = get(&app, "/movies/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["status"], 404);
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = app();
    let (status, _) = get(&app, "/watchlist").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/movies/1/reviews",
            Some("00000000-0000-0000-0000-000000000000"),
            json!({ "review_text": "Great fun", "rating": 8 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_password_is_unauthorized() {
    let (status, body) = send(
        &app(),
        json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "user_name": "thorke", "password": "nope" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Invalid user name or password");
}

#[tokio::test]
async fn register_login_review_and_logout() {
    let app = app();
    let credentials = json!({ "user_name": "Shyamli", "password": "Abcdef12" });

    let (status, body) = send(&app, json_request("POST", "/auth/register", None, credentials.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_name"], "shyamli");

    let (status, _) = send(&app, json_request("POST", "/auth/register", None, credentials)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let token = login(&app, "SHYAMLI", "Abcdef12").await;
    let (status, review) = send(
        &app,
        json_request(
            "POST",
            "/movies/2/reviews",
            Some(&token),
            json!({ "review_text": "Gorgeous but baffling", "rating": 6 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["user_name"], "shyamli");

    let (_, reviews) = get(&app, "/movies/2/reviews").await;
    assert_eq!(reviews.as_array().unwrap().len(), 1);
    assert_eq!(reviews[0]["rating"], 6);

    let (status, _) = send(&app, json_request("POST", "/auth/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        json_request("GET", "/watchlist", Some(&token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn watch_list_add_and_remove() {
    let app = app();
    let token = login(&app, "thorke", "cLQ^C#oFXloS").await;

    let (_, list) = send(&app, json_request("POST", "/watchlist", Some(&token), json!({ "movie_id": 55 }))).await;
    assert_eq!(ids(&list), vec![55]);

    let (_, list) = send(&app, json_request("POST", "/watchlist", Some(&token), json!({ "movie_id": 3 }))).await;
    assert_eq!(ids(&list), vec![55, 3]);

    let (_, list) = send(&app, json_request("DELETE", "/watchlist", Some(&token), json!({ "movie_id": 55 }))).await;
    assert_eq!(ids(&list), vec![3]);

    let (status, _) = send(&app, json_request("POST", "/watchlist", Some(&token), json!({ "movie_id": 4040 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn database_backend_serves_the_same_catalogue() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        repository: RepositoryKind::Database,
        database_path: dir.path().join("movies.db"),
        ..ServerConfig::memory(data_dir())
    };
    let app = app_with(&config);

    let (_, body) = get(&app, "/movies/genre/Sci-Fi?page_size=10").await;
    assert_eq!(ids(&body["movies"]), vec![1, 2, 65, 81]);

    let token = login(&app, "fmercury", "mvNNbc1eLA$i").await;
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/movies/81/reviews",
            Some(&token),
            json!({ "review_text": "Dreams within dreams", "rating": 9 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Reopening an already populated file keeps the new review
    let reopened = app_with(&config);
    let (_, reviews) = get(&reopened, "/movies/81/reviews").await;
    assert_eq!(reviews[0]["review_text"], "Dreams within dreams");
}

#[tokio::test]
async fn malformed_requests_use_the_error_body() {
    let app = app();

    let (status, body) = get(&app, "/movies/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], 400);

    let (status, body) = get(&app, "/movies/inception").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].is_string());

    let token = login(&app, "thorke", "cLQ^C#oFXloS").await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/movies/1/reviews",
            Some(&token),
            json!({ "review_text": "Off the scale", "rating": 300 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["status"], 422);
}
