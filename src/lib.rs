use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod query;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated session identity.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the application entry point.
pub use catalog::Catalog;
pub use config::AppConfig;
pub use errors::Error;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the service by
/// aggregating every handler decorated with `#[utoipa::path]` and every schema
/// deriving `utoipa::ToSchema`. The resulting JSON is served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::signup, handlers::login, handlers::logout,
        handlers::get_actors, handlers::get_actor, handlers::create_actor,
        handlers::update_actor, handlers::delete_actor,
        handlers::get_films, handlers::get_film, handlers::create_film,
        handlers::update_film, handlers::delete_film,
        handlers::get_film_actors, handlers::add_film_actors, handlers::remove_film_actors,
    ),
    components(
        schemas(
            models::Actor, models::Film,
            models::SignupRequest, models::LoginRequest, models::UserResponse,
            models::CreateActorRequest, models::UpdateActorRequest,
            models::CreateFilmRequest, models::UpdateFilmRequest,
        )
    ),
    tags(
        (name = "film-catalog", description = "Film & Actor Catalog API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across every incoming request.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Catalog Layer: domain rules for films, actors, and their associations.
    pub catalog: Catalog,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let handlers and extractors pull individual components out of the shared
// AppState instead of depending on the whole container.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for Catalog {
    fn from_ref(app_state: &AppState) -> Catalog {
        app_state.catalog.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces the authenticated tier. The `AuthUser` extractor does the work:
/// it verifies the session cookie and rejects the request with 401 before the
/// handler runs if the cookie is missing, tampered with, or expired.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Enforces the admin tier on top of authentication. The two failure modes
/// stay distinct: no valid session is 401 (raised by the extractor before this
/// body runs), a valid non-admin session is 403.
async fn admin_middleware(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !auth_user.is_admin {
        tracing::debug!("admin tier refused for user={}", auth_user.username);
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// tier-scoped middleware, and registers the shared state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public tier: no middleware applied.
        .merge(public::public_routes())
        // Authenticated tier: session verification only.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin tier: session verification plus the role check. Merged at the
        // same paths as the read routes; the method decides the tier.
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        )
        // Apply the unified state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a unique UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle in a
                // span carrying the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer.
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes `TraceLayer` span creation: pulls the `x-request-id` header into
/// the span so every log line for one request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
