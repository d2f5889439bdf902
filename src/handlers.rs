use crate::{
    AppState, auth,
    errors::{Error, ValidationError},
    models::{
        Actor, CreateActorRequest, CreateFilmRequest, Film, LoginRequest, SignupRequest,
        UpdateActorRequest, UpdateFilmRequest, UserResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;

// --- Filter Structs ---

/// FilmFilter
///
/// The accepted query parameters for film search (GET /films). Used by Axum's
/// Query extractor to safely bind HTTP query parameters; absent parameters
/// place no constraint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct FilmFilter {
    /// Sort key: one of `title`, `rating`, `release`. Defaults to `rating`.
    pub sort: Option<String>,
    /// Exact film title to filter on.
    pub film: Option<String>,
    /// Exact actor name to filter on.
    pub actor: Option<String>,
}

// Username and password must both be present; every violation is reported.
fn validate_credentials(username: &str, password: &str) -> Result<(), Error> {
    let mut ve = ValidationError::new();
    if username.is_empty() {
        ve.add("username of length 0");
    }
    if password.is_empty() {
        ve.add("password of length 0");
    }
    ve.into_result()
}

// --- Account Handlers ---

/// signup
///
/// [Public Route] Creates a new (non-admin) account. The password is hashed
/// with bcrypt before it reaches storage; the clear text is never persisted
/// or logged.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 409, description = "Username taken")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<UserResponse>, Error> {
    validate_credentials(&payload.username, &payload.password)?;

    let pass_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)?;
    let user = state.repo.create_user(&payload.username, &pass_hash).await?;

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}

/// login
///
/// [Public Route] Verifies the credentials and, on success, issues a signed
/// session token delivered as the `jwt` cookie. An unknown username and a
/// wrong password are indistinguishable to the caller, and no cookie is set
/// on failure.
#[utoipa::path(
    post,
    path = "/signin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie set"),
        (status = 401, description = "Incorrect credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, Error> {
    validate_credentials(&payload.username, &payload.password)?;

    let user = state.repo.get_user_by_username(&payload.username).await?;

    if !bcrypt::verify(&payload.password, &user.pass_hash)? {
        return Err(Error::PasswordIncorrect);
    }

    let token = auth::issue_token(
        &state.config.signing_key,
        user.id,
        &user.username,
        user.is_admin,
        Utc::now(),
    )?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, auth::session_cookie(&token))],
    ))
}

/// logout
///
/// [Public Route] Clears the session cookie. Logging out without a session is
/// a 401; there is nothing server-side to revoke, so clearing the cookie is
/// the entire operation.
#[utoipa::path(
    delete,
    path = "/signout",
    responses(
        (status = 200, description = "Session cleared"),
        (status = 401, description = "No session cookie")
    )
)]
pub async fn logout(headers: HeaderMap) -> Result<impl IntoResponse, Error> {
    if auth::session_token(&headers).is_none() {
        return Err(Error::Unauthenticated);
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, auth::expired_session_cookie())],
    ))
}

// --- Actor Handlers ---

/// get_actors
///
/// [Authenticated Route] Lists every actor, each carrying the titles of its
/// associated films.
#[utoipa::path(
    get,
    path = "/actors",
    responses((status = 200, description = "All actors", body = [Actor]))
)]
pub async fn get_actors(State(state): State<AppState>) -> Result<Json<Vec<Actor>>, Error> {
    Ok(Json(state.catalog.list_actors().await?))
}

/// get_actor
///
/// [Authenticated Route] Retrieves a single actor. A malformed id and an
/// unknown id both surface as 404.
#[utoipa::path(
    get,
    path = "/actors/{id}",
    params(("id" = String, Path, description = "Actor ID")),
    responses(
        (status = 200, description = "Found", body = Actor),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_actor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Actor>, Error> {
    Ok(Json(state.catalog.get_actor(&id).await?))
}

/// create_actor
///
/// [Admin Route] Adds a new actor to the catalog.
#[utoipa::path(
    post,
    path = "/actors",
    request_body = CreateActorRequest,
    responses(
        (status = 200, description = "Created", body = Actor),
        (status = 400, description = "Validation failure")
    )
)]
pub async fn create_actor(
    State(state): State<AppState>,
    Json(payload): Json<CreateActorRequest>,
) -> Result<Json<Actor>, Error> {
    Ok(Json(state.catalog.create_actor(&payload).await?))
}

/// update_actor
///
/// [Admin Route] Partially updates an actor; only the fields present in the
/// payload are overwritten. Responds with the re-read, authoritative row.
#[utoipa::path(
    put,
    path = "/actors/{id}",
    params(("id" = String, Path, description = "Actor ID")),
    request_body = UpdateActorRequest,
    responses(
        (status = 200, description = "Updated", body = Actor),
        (status = 400, description = "Empty or invalid update"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_actor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateActorRequest>,
) -> Result<Json<Actor>, Error> {
    Ok(Json(state.catalog.update_actor(&id, &payload).await?))
}

/// delete_actor
///
/// [Admin Route] Removes an actor and all of its film associations.
#[utoipa::path(
    delete,
    path = "/actors/{id}",
    params(("id" = String, Path, description = "Actor ID")),
    responses(
        (status = 200, description = "Deleted", body = Actor),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_actor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Actor>, Error> {
    Ok(Json(state.catalog.delete_actor(&id).await?))
}

// --- Film Handlers ---

/// get_films
///
/// [Authenticated Route] Lists films with optional filtering and sorting.
/// Absent filters return the whole catalog; an unknown sort key is a
/// validation failure.
#[utoipa::path(
    get,
    path = "/films",
    params(FilmFilter),
    responses(
        (status = 200, description = "Matching films", body = [Film]),
        (status = 400, description = "Unknown sort key")
    )
)]
pub async fn get_films(
    State(state): State<AppState>,
    Query(filter): Query<FilmFilter>,
) -> Result<Json<Vec<Film>>, Error> {
    let films = state
        .catalog
        .search_films(
            filter.sort.as_deref(),
            filter.film.as_deref(),
            filter.actor.as_deref(),
        )
        .await?;
    Ok(Json(films))
}

/// get_film
///
/// [Authenticated Route] Retrieves a single film with its actor names.
#[utoipa::path(
    get,
    path = "/films/{id}",
    params(("id" = String, Path, description = "Film ID")),
    responses(
        (status = 200, description = "Found", body = Film),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_film(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Film>, Error> {
    Ok(Json(state.catalog.get_film(&id).await?))
}

/// create_film
///
/// [Admin Route] Adds a film, optionally linking actors in the same atomic
/// unit. One bad actor id rejects the whole request.
#[utoipa::path(
    post,
    path = "/films",
    request_body = CreateFilmRequest,
    responses(
        (status = 200, description = "Created", body = Film),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Unknown or duplicate actor")
    )
)]
pub async fn create_film(
    State(state): State<AppState>,
    Json(payload): Json<CreateFilmRequest>,
) -> Result<Json<Film>, Error> {
    Ok(Json(state.catalog.create_film(&payload).await?))
}

/// update_film
///
/// [Admin Route] Partially updates a film. A payload with no fields is
/// rejected before storage is touched.
#[utoipa::path(
    put,
    path = "/films/{id}",
    params(("id" = String, Path, description = "Film ID")),
    request_body = UpdateFilmRequest,
    responses(
        (status = 200, description = "Updated", body = Film),
        (status = 400, description = "Empty or invalid update"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_film(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateFilmRequest>,
) -> Result<Json<Film>, Error> {
    Ok(Json(state.catalog.update_film(&id, &payload).await?))
}

/// delete_film
///
/// [Admin Route] Removes a film; its associations are cascaded in the same
/// atomic unit.
#[utoipa::path(
    delete,
    path = "/films/{id}",
    params(("id" = String, Path, description = "Film ID")),
    responses(
        (status = 200, description = "Deleted", body = Film),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_film(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Film>, Error> {
    Ok(Json(state.catalog.delete_film(&id).await?))
}

// --- Association Handlers ---

/// get_film_actors
///
/// [Authenticated Route] Lists the actors linked to a film. A film with no
/// links responds 404 rather than an empty list, so clients can special-case
/// the "empty but valid" state.
#[utoipa::path(
    get,
    path = "/films/{id}/actors",
    params(("id" = String, Path, description = "Film ID")),
    responses(
        (status = 200, description = "Linked actors", body = [Actor]),
        (status = 404, description = "Not Found or no linked actors")
    )
)]
pub async fn get_film_actors(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Actor>>, Error> {
    Ok(Json(state.catalog.film_actors(&id).await?))
}

/// add_film_actors
///
/// [Admin Route] Links a batch of actors to a film. The batch is validated in
/// full before any write: an unknown actor or an already-linked pair rejects
/// everything and the association set stays unchanged.
#[utoipa::path(
    put,
    path = "/films/{id}/actors",
    params(("id" = String, Path, description = "Film ID")),
    request_body = Vec<i32>,
    responses(
        (status = 200, description = "Linked", body = Film),
        (status = 400, description = "Empty batch"),
        (status = 409, description = "Unknown or already linked actor")
    )
)]
pub async fn add_film_actors(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(actor_ids): Json<Vec<i32>>,
) -> Result<Json<Film>, Error> {
    Ok(Json(state.catalog.add_film_actors(&id, &actor_ids).await?))
}

/// remove_film_actors
///
/// [Admin Route] Unlinks a batch of actors from a film. Removing a pair that
/// does not exist is not an error; only a film with no associations at all
/// rejects the request.
#[utoipa::path(
    delete,
    path = "/films/{id}/actors",
    params(("id" = String, Path, description = "Film ID")),
    request_body = Vec<i32>,
    responses(
        (status = 200, description = "Unlinked", body = Film),
        (status = 400, description = "Empty batch"),
        (status = 404, description = "Not Found or no linked actors")
    )
)]
pub async fn remove_film_actors(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(actor_ids): Json<Vec<i32>>,
) -> Result<Json<Film>, Error> {
    Ok(Json(
        state.catalog.remove_film_actors(&id, &actor_ids).await?,
    ))
}
