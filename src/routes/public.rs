use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Public Router Module
///
/// Defines endpoints that are accessible to any client, with or without a
/// session: the health probe and the account gateway (signup / signin /
/// signout). No catalog data is reachable from this tier.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /signup
        // Creates a new non-admin account. Admin accounts are provisioned
        // out-of-band, never through this endpoint.
        .route("/signup", post(handlers::signup))
        // POST /signin
        // Verifies credentials and installs the session cookie on success.
        .route("/signin", post(handlers::login))
        // DELETE /signout
        // Clears the session cookie. Rejected when no session is present.
        .route("/signout", delete(handlers::logout))
}
