//! Session token codec.
//!
//! A session is an HS256-signed JWT carried in the `session` cookie. Issuing
//! can fail (and says why); verification never does: any malformed, forged or
//! out-of-window token is simply "no session".

use axum::http::{HeaderMap, header};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Role
///
/// The closed set of portal roles, ordered by privilege
/// `Superadmin > Admin > User`. Any unrecognised or missing value maps to
/// `User`, so a typo in a claim can never elevate a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, TS, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Superadmin,
    Admin,
    #[default]
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Superadmin, Role::Admin, Role::User];

    /// Total mapping from a claim string to a role. Unknown input is `User`.
    pub fn parse(raw: &str) -> Self {
        Self::parse_strict(raw).unwrap_or_default()
    }

    /// Exact mapping used when validating requests that set a role.
    pub fn parse_strict(raw: &str) -> Option<Self> {
        match raw {
            "superadmin" => Some(Role::Superadmin),
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin_tier(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Role::parse).unwrap_or_default())
    }
}

/// SessionIdentity
///
/// What the sign-in and sign-up handlers know about a principal at the
/// moment a session is created.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub user_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// SessionClaims
///
/// The verified payload of a session token. Display attributes are opaque to
/// the access decision; only `role` and validity matter there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionClaims {
    pub user_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_provider")]
    pub auth_provider: String,
    /// Issued At, seconds since the Unix epoch.
    pub iat: u64,
    /// Expiration Time, seconds since the Unix epoch. Exclusive.
    pub exp: u64,
}

fn default_provider() -> String {
    "credentials".to_string()
}

impl SessionClaims {
    /// A session is live on the half-open window `[iat, exp)`.
    pub fn is_live_at(&self, now: u64) -> bool {
        self.iat <= now && now < self.exp
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// SessionKeys
///
/// The signing and verification keys derived from the configured secret.
/// Constructed explicitly at startup (or per test) and shared by value.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issues a token for `identity`, valid from now for the configured TTL.
    pub fn issue(&self, identity: &SessionIdentity) -> Result<String, SessionError> {
        self.issue_at(identity, now_secs())
    }

    pub fn issue_at(&self, identity: &SessionIdentity, now: u64) -> Result<String, SessionError> {
        let claims = SessionClaims {
            user_id: identity.user_id,
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            role: identity.role,
            auth_provider: default_provider(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verifies `token` against the current clock.
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        self.verify_at(token, now_secs())
    }

    /// verify_at
    ///
    /// Checks structure, HS256 signature and the `[iat, exp)` window at `now`.
    /// The reason for a rejection is logged and then discarded.
    pub fn verify_at(&self, token: &str, now: u64) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // The window is checked below against the injected clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = match decode::<SessionClaims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(reason = ?e.kind(), "session token rejected");
                return None;
            }
        };

        if !claims.is_live_at(now) {
            tracing::debug!(user_id = claims.user_id, "session token outside validity window");
            return None;
        }
        Some(claims)
    }
}

pub fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// session_token
///
/// Pulls the `session` cookie out of every `Cookie` header on the request.
/// Empty values count as absent, so the first non-empty `session` wins.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .find(|value| !value.is_empty())
}

/// `Set-Cookie` value that installs a session.
pub fn session_cookie(token: &str, ttl_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that deletes the session.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}
