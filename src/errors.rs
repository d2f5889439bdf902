use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// ValidationError
///
/// Accumulates field-level violations so a request with several bad fields is
/// reported in full, not just the first failure. The rendered message joins
/// every violation with "; ".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationError {
    violations: Vec<String>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, violation: impl Into<String>) {
        self.violations.push(violation.into());
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Converts the collected violations into a terminal `Err` value, or `Ok`
    /// when nothing was recorded.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.violations.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Error
///
/// The closed error taxonomy for the whole service. Every operation returns one
/// of these kinds up to the HTTP boundary, where `IntoResponse` maps it to a
/// status code and a stable `{errorType, body}` JSON shape.
///
/// `IdInvalid` and the not-found kinds are deliberately distinct variants even
/// though they collapse to the same 404 externally; callers inside the crate
/// may branch on the precise kind.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("invalid id")]
    IdInvalid,

    #[error("film does not exist")]
    FilmNotExist,

    #[error("actor does not exist")]
    ActorNotFound,

    /// An actor id referenced by a film mutation does not exist. Unlike
    /// `ActorNotFound` this is a conflict: the request as a whole names an
    /// impossible association.
    #[error("one of the provided actors is non-existent")]
    ActorNotExist,

    #[error("one of the provided actors is already bound to the film")]
    FilmActorExist,

    #[error("film has no associated actors")]
    ZeroActors,

    #[error("empty update")]
    EmptyUpdate,

    #[error("user already exists")]
    UserExist,

    #[error("user does not exist")]
    UserNotExist,

    #[error("password is incorrect")]
    PasswordIncorrect,

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("token signing error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// ErrorMessage
///
/// The structured error body sent to clients. `errorType` is a stable machine
/// readable discriminator; `body` is a human readable explanation.
#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "errorType")]
    pub error_type: &'static str,
    pub body: String,
}

impl ErrorMessage {
    fn new(error_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            error_type,
            body: body.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::Validation(ve) => (
                StatusCode::BAD_REQUEST,
                ErrorMessage::new("validation", ve.to_string()),
            ),
            Error::EmptyUpdate => (
                StatusCode::BAD_REQUEST,
                ErrorMessage::new("validation", self.to_string()),
            ),
            // Malformed ids and missing rows share one external signal so the
            // response does not reveal which case occurred.
            Error::IdInvalid | Error::FilmNotExist | Error::ActorNotFound | Error::ZeroActors => (
                StatusCode::NOT_FOUND,
                ErrorMessage::new("not_found", "not found"),
            ),
            Error::ActorNotExist | Error::FilmActorExist | Error::UserExist => (
                StatusCode::CONFLICT,
                ErrorMessage::new("conflict", self.to_string()),
            ),
            // Login failures look identical whether the account is missing or
            // the password is wrong.
            Error::UserNotExist | Error::PasswordIncorrect => (
                StatusCode::UNAUTHORIZED,
                ErrorMessage::new("validation", "incorrect username or password"),
            ),
            Error::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorMessage::new("unauthenticated", "authentication required"),
            ),
            Error::Database(_) | Error::Hash(_) | Error::Token(_) => {
                // Full detail stays in the logs; the caller only learns that
                // something internal failed.
                tracing::error!("internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorMessage::new("internal", "internal server error"),
                )
            }
        };

        (status, Json(message)).into_response()
    }
}
