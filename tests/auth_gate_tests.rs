use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, NaiveDate, Utc};
use film_catalog::{
    AppConfig, AppState, Catalog, auth, create_router,
    errors::Error,
    models::{Actor, Film, NewFilm, User},
    query::FieldSet,
    repository::{Repository, RepositoryState},
};
use std::sync::Arc;
use tower::util::ServiceExt;

// --- Stub Repository ---

// The tier middlewares decide a request's fate before any handler logic runs,
// so the repository behind the router only needs to produce benign defaults.
struct StubRepository;

#[async_trait]
impl Repository for StubRepository {
    async fn create_user(&self, _u: &str, _p: &str) -> Result<User, Error> {
        Ok(User::default())
    }
    async fn get_user_by_username(&self, _u: &str) -> Result<User, Error> {
        Err(Error::UserNotExist)
    }
    async fn list_actors(&self) -> Result<Vec<Actor>, Error> {
        Ok(vec![])
    }
    async fn get_actor(&self, _id: i32) -> Result<Actor, Error> {
        Ok(Actor::default())
    }
    async fn insert_actor(
        &self,
        name: &str,
        sex: &str,
        birthday: Option<NaiveDate>,
    ) -> Result<Actor, Error> {
        Ok(Actor {
            id: 1,
            name: name.to_string(),
            sex: sex.to_string(),
            birthday,
            films: vec![],
        })
    }
    async fn update_actor(&self, _id: i32, _f: &FieldSet) -> Result<(), Error> {
        Ok(())
    }
    async fn delete_actor(&self, _id: i32) -> Result<(), Error> {
        Ok(())
    }
    async fn actor_exists(&self, _id: i32) -> Result<bool, Error> {
        Ok(true)
    }
    async fn search_films(&self, _o: &str, _f: &FieldSet) -> Result<Vec<Film>, Error> {
        Ok(vec![])
    }
    async fn get_film(&self, _id: i32) -> Result<Film, Error> {
        Ok(Film::default())
    }
    async fn insert_film(&self, _f: &NewFilm, _a: &[i32]) -> Result<i32, Error> {
        Ok(1)
    }
    async fn update_film(&self, _id: i32, _f: &FieldSet) -> Result<(), Error> {
        Ok(())
    }
    async fn delete_film(&self, _id: i32) -> Result<(), Error> {
        Ok(())
    }
    async fn film_actors(&self, _id: i32) -> Result<Vec<Actor>, Error> {
        Ok(vec![Actor::default()])
    }
    async fn film_actor_ids(&self, _id: i32) -> Result<Vec<i32>, Error> {
        Ok(vec![])
    }
    async fn link_actors(&self, _f: i32, _a: &[i32]) -> Result<(), Error> {
        Ok(())
    }
    async fn unlink_actors(&self, _f: i32, _a: &[i32]) -> Result<(), Error> {
        Ok(())
    }
}

// --- Setup ---

fn test_state() -> AppState {
    let repo = Arc::new(StubRepository) as RepositoryState;
    AppState {
        catalog: Catalog::new(repo.clone()),
        repo,
        config: AppConfig::default(),
    }
}

fn cookie_for(state: &AppState, is_admin: bool) -> String {
    let token = auth::issue_token(
        &state.config.signing_key,
        1,
        if is_admin { "root" } else { "viewer" },
        is_admin,
        Utc::now(),
    )
    .expect("issue failed");
    format!("jwt={token}")
}

async fn request(
    state: AppState,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> StatusCode {
    let router = create_router(state);

    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    router.oneshot(request).await.unwrap().status()
}

fn actor_payload() -> serde_json::Value {
    serde_json::json!({ "name": "Al Pacino", "sex": "male" })
}

// --- Tests ---

#[tokio::test]
async fn test_health_is_public() {
    let status = request(test_state(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reads_require_a_session() {
    for uri in ["/actors", "/actors/1", "/films", "/films/1", "/films/1/actors"] {
        let status = request(test_state(), "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "GET {uri} without cookie");
    }
}

#[tokio::test]
async fn test_non_admin_session_can_read() {
    let state = test_state();
    let cookie = cookie_for(&state, false);

    let status = request(state, "GET", "/actors", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_non_admin_session_cannot_mutate() {
    let state = test_state();
    let cookie = cookie_for(&state, false);

    // Authenticated but not authorized: the distinct 403 signal.
    let status = request(
        state,
        "POST",
        "/actors",
        Some(&cookie),
        Some(actor_payload()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_mutations_without_session_are_401_not_403() {
    let status = request(test_state(), "POST", "/actors", None, Some(actor_payload())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_session_can_mutate() {
    let state = test_state();
    let cookie = cookie_for(&state, true);

    let status = request(
        state,
        "POST",
        "/actors",
        Some(&cookie),
        Some(actor_payload()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_tampered_cookie_is_rejected_before_role_check() {
    let state = test_state();
    let mut cookie = cookie_for(&state, true);
    // Corrupt the signature segment.
    cookie.pop();
    cookie.push('x');

    let status = request(
        state,
        "POST",
        "/actors",
        Some(&cookie),
        Some(actor_payload()),
    )
    .await;
    // A forged admin assertion never reaches the 403 branch.
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let state = test_state();
    let token = auth::issue_token(
        &state.config.signing_key,
        1,
        "viewer",
        false,
        Utc::now() - Duration::days(2),
    )
    .expect("issue failed");
    let cookie = format!("jwt={token}");

    let status = request(state, "GET", "/actors", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_tier_applies_to_association_routes() {
    let state = test_state();
    let viewer = cookie_for(&state, false);

    // Same path, different method, different tier.
    let read = request(
        test_state(),
        "GET",
        "/films/1/actors",
        Some(&viewer),
        None,
    )
    .await;
    assert_eq!(read, StatusCode::OK);

    let write = request(
        test_state(),
        "PUT",
        "/films/1/actors",
        Some(&viewer),
        Some(serde_json::json!([1, 2])),
    )
    .await;
    assert_eq!(write, StatusCode::FORBIDDEN);
}
