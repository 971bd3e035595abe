use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Endpoints for any principal with a valid session, whatever the role.
/// Handlers take `SessionUser`, which rejects anonymous calls with 401.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /api/navigation?path=...
        // Sidebar entries visible to the caller's role and the active page title.
        .route("/api/navigation", get(handlers::navigation))
}
