use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::decision::{Access, evaluate};
use crate::{AppState, session::session_token};

/// route_guard
///
/// Middleware applied to the whole router. Runs the access decision for the
/// request path and either forwards the request untouched or answers with a
/// `307 Temporary Redirect` to login, home, or the unauthorized page.
///
/// Verification is redone on every request; no decision is cached.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let token = session_token(request.headers());
    let access = evaluate(&state.routes, &state.keys, &path, token);

    match access.location() {
        None => next.run(request).await,
        Some(location) => {
            match &access {
                Access::RedirectWithReturnTo { .. } => {
                    tracing::debug!(%path, "no valid session, redirecting to login")
                }
                _ => tracing::debug!(%path, %location, "route guard redirect"),
            }
            Redirect::temporary(&location).into_response()
        }
    }
}
