use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};

use crate::{
    errors::ApiError,
    session::{Role, SessionClaims, SessionKeys, session_token},
};

/// SessionUser
///
/// The verified identity behind a request, resolved from the `session`
/// cookie. Handlers take it as an argument; a request without a valid
/// session never reaches them (401 JSON instead).
#[derive(Debug, Clone)]
pub struct SessionUser(pub SessionClaims);

impl SessionUser {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    /// Superadmin gate used by the user management endpoints.
    pub fn require_superadmin(&self) -> Result<(), ApiError> {
        match self.role() {
            Role::Superadmin => Ok(()),
            _ => Err(ApiError::unauthorized()),
        }
    }

    fn resolve(parts: &Parts, keys: &SessionKeys) -> Option<Self> {
        session_token(&parts.headers)
            .and_then(|token| keys.verify(token))
            .map(SessionUser)
    }
}

/// SessionUser Extractor Implementation
///
/// Only the token is consulted: no database lookup, no caching. Any failure
/// (missing cookie, bad signature, expired) is the same 401.
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        SessionUser::resolve(parts, &keys).ok_or_else(ApiError::unauthorized)
    }
}

/// `Option<SessionUser>` for endpoints that behave differently for signed-in
/// callers but never reject anonymous ones.
impl<S> OptionalFromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        Ok(SessionUser::resolve(parts, &keys))
    }
}
