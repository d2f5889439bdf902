use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Defines the read-only catalog routes available to any account holding a
/// valid session. Every handler here relies on the session-verification
/// middleware layered above this module; the handlers themselves never touch
/// tokens.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /actors
        // Lists every actor with the titles of its associated films.
        .route("/actors", get(handlers::get_actors))
        // GET /actors/{id}
        // Retrieves a single actor by id.
        .route("/actors/{id}", get(handlers::get_actor))
        // GET /films?sort=...&film=...&actor=...
        // Searches the film catalog with optional title/actor filters and a
        // whitelisted sort key.
        .route("/films", get(handlers::get_films))
        // GET /films/{id}
        // Retrieves a single film by id.
        .route("/films/{id}", get(handlers::get_film))
        // GET /films/{id}/actors
        // Lists the actors linked to a film; a film with no links is 404.
        .route("/films/{id}/actors", get(handlers::get_film_actors))
}
