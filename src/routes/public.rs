use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. The `/api/auth/*` paths are bypass
/// entries in the route table, so the guard never redirects them; `/health`
/// is an explicit public entry.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/signin
        // Username-or-email login; sets the `session` cookie.
        .route("/api/auth/signin", post(handlers::sign_in))
        // POST /api/auth/signup
        // Self-registration (role `user`), or superadmin-created accounts.
        .route("/api/auth/signup", post(handlers::sign_up))
        // POST /api/auth/logout (JSON) and GET /api/auth/logout (browser redirect)
        .route(
            "/api/auth/logout",
            post(handlers::logout).get(handlers::logout_redirect),
        )
        // GET /api/auth/me
        // The verified claim set of the current session, polled by the shell.
        .route("/api/auth/me", get(handlers::me))
}
