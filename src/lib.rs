use axum::{
    Json, Router,
    extract::FromRef,
    http::{HeaderName, StatusCode},
    middleware,
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;
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

// The request gatekeeper and the token format it consumes.
pub mod access;
pub mod session;

// Services and components around the gatekeeper.
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod navigation;
pub mod password;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Superadmin).
pub mod routes;
use routes::{authenticated, public, superadmin};

// --- Public Re-exports ---

pub use access::RouteTable;
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use session::SessionKeys;

/// ApiDoc
///
/// OpenAPI description of the JSON API, served at `/api-docs/openapi.json`
/// and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::sign_in, handlers::sign_up, handlers::logout, handlers::logout_redirect,
        handlers::me, handlers::navigation, handlers::list_users, handlers::update_user_role,
        handlers::delete_user
    ),
    components(
        schemas(
            models::SignInRequest, models::SignUpRequest, models::UpdateRoleRequest,
            models::PublicUser, models::UserSummary, models::UserEnvelope, models::UsersResponse,
            models::RoleUpdated, models::SuccessResponse, session::Role, session::SessionClaims,
            handlers::MeResponse, navigation::NavLink, navigation::NavigationResponse,
        )
    ),
    tags(
        (name = "wms-admin-portal", description = "Warehouse platform administration API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for everything a request may need. Cheap to
/// clone; nothing in it is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for portal accounts.
    pub repo: RepositoryState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
    /// Session codec built from `config.session_secret`.
    pub keys: SessionKeys,
    /// Ordered route protection rules.
    pub routes: Arc<RouteTable>,
}

impl AppState {
    /// Wires the standard route table and the session keys derived from `config`.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            repo,
            keys: config.session_keys(),
            routes: Arc::new(RouteTable::standard()),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(app_state: &AppState) -> SessionKeys {
        app_state.keys.clone()
    }
}

/// Anything not served by this API. Pages are rendered elsewhere, but the
/// guard still runs first, so an unauthorised visitor sees a redirect.
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Not found." })),
    )
}

/// create_router
///
/// Assembles the routes, puts the route guard in front of all of them
/// (fallback included), and wraps everything in the observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .nest("/api/superadmin", superadmin::superadmin_routes())
        .fallback(not_found)
        // The guard must be added after every route and the fallback.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access::route_guard,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of one request carries the
/// same `x-request-id`.
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
