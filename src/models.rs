use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical account record from the `users` table. The password verifier
/// is an opaque bcrypt hash and never leaves the server; API responses use
/// `UserResponse` instead of serializing this struct.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub pass_hash: String,
    pub is_admin: bool,
}

/// Actor
///
/// An actor record from the `actors` table, denormalized with the titles of
/// every film the actor is associated with.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Actor {
    pub id: i32,
    pub name: String,
    /// One of "male" / "female". Empty means "unspecified" and only ever
    /// appears through updates, never through creation.
    pub sex: String,
    pub birthday: Option<NaiveDate>,
    /// Titles of associated films, loaded via a JOIN and aggregation.
    pub films: Vec<String>,
}

/// Film
///
/// A film record from the `films` table, denormalized with the names of its
/// associated actors.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Film {
    pub id: i32,
    pub title: String,
    pub genre: Option<String>,
    pub release_date: NaiveDate,
    /// 0..=10 inclusive.
    pub rating: i32,
    /// Names of associated actors, loaded via a JOIN and aggregation.
    pub actors: Vec<String>,
}

/// NewFilm
///
/// Validated film fields ready for insertion. Produced by the catalog manager
/// after request validation; consumed by the repository.
#[derive(Debug, Clone)]
pub struct NewFilm {
    pub title: String,
    pub genre: Option<String>,
    pub release_date: NaiveDate,
    pub rating: i32,
}

// --- Request Payloads (Input Schemas) ---

/// SignupRequest
///
/// Input payload for account creation (POST /signup). The password is hashed
/// immediately and never persisted or logged in clear text.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for POST /signin.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// CreateActorRequest
///
/// Input payload for POST /actors. The birthday arrives as a `YYYY-MM-DD`
/// string and is parsed during validation; it may be omitted entirely.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateActorRequest {
    pub name: String,
    pub sex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}

/// UpdateActorRequest
///
/// Partial update payload for PUT /actors/{id}. Fields left out of the JSON
/// are left untouched; a request carrying no fields at all is rejected before
/// storage is consulted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateActorRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}

/// CreateFilmRequest
///
/// Input payload for POST /films. Any supplied actor ids are validated as a
/// batch and linked atomically with the insert.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateFilmRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    pub release_date: String,
    pub rating: i32,
    #[serde(default)]
    pub actor_ids: Vec<i32>,
}

/// UpdateFilmRequest
///
/// Partial update payload for PUT /films/{id}. Same omission semantics as
/// `UpdateActorRequest`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateFilmRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
}

// --- Response Schemas (Output) ---

/// UserResponse
///
/// Output schema for account creation: the assigned id and the username,
/// nothing secret.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
}
