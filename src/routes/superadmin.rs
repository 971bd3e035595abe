use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Superadmin Router Module
///
/// The user management API behind the Users screen. Every handler verifies
/// `role == superadmin` on the session and answers 401 otherwise.
pub fn superadmin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/superadmin/users?search=...&role=...
        .route("/users", get(handlers::list_users))
        // PATCH changes the role, DELETE removes the account; same URL,
        // distinguished by method.
        .route(
            "/users/{id}",
            axum::routing::patch(handlers::update_user_role).delete(handlers::delete_user),
        )
}
