use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Admin Router Module
///
/// Defines every route that mutates the catalog. The whole module is wrapped
/// in the admin middleware: a request first proves it carries a valid session
/// (401 otherwise), then that the session asserts the admin role (403
/// otherwise). Non-admin sessions can read everything and change nothing.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /actors
        // Adds a new actor to the catalog.
        .route("/actors", post(handlers::create_actor))
        // PUT/DELETE /actors/{id}
        // Partial update and removal of a single actor. Deleting an actor
        // cascades its film associations.
        .route(
            "/actors/{id}",
            put(handlers::update_actor).delete(handlers::delete_actor),
        )
        // POST /films
        // Adds a film, optionally linking actors atomically with the insert.
        .route("/films", post(handlers::create_film))
        // PUT/DELETE /films/{id}
        // Partial update and removal of a single film.
        .route(
            "/films/{id}",
            put(handlers::update_film).delete(handlers::delete_film),
        )
        // PUT/DELETE /films/{id}/actors
        // Batch link / unlink of actors for a film. The add direction rejects
        // duplicates; the remove direction is idempotent per pair.
        .route(
            "/films/{id}/actors",
            put(handlers::add_film_actors).delete(handlers::remove_film_actors),
        )
}
