use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::session::Role;

pub const MIN_PASSWORD_LEN: usize = 8;

// --- Core Schemas (Mapped to Database) ---

/// UserAccount
///
/// A full row of the `superadmin_users` table, including the password hash.
/// Never serialized; handlers convert it into `PublicUser` before responding.
#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
}

/// UserSummary
///
/// One line of the user management table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[ts(type = "string | null")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// PublicUser
///
/// The identity returned to the browser after sign-in or sign-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<&UserAccount> for PublicUser {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            role: account.role,
        }
    }
}

/// NewUser
///
/// A validated sign-up, ready for insertion. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
}

/// UserListFilter
///
/// Normalized listing criteria: a case-insensitive search term and an
/// optional exact role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserListFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
}

// --- Request Payloads (Input Schemas) ---

/// SignInRequest
///
/// `username` accepts either the username or the email address.
/// Fields default to empty so missing input becomes a 400, not a 422.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignInRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignUpRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
    pub phone: Option<String>,
}

impl SignUpRequest {
    /// validate
    ///
    /// Field-level checks in the order the form reports them. Returns the
    /// requested role on success.
    pub fn validate(&self) -> Result<Role, &'static str> {
        let required = [
            &self.username,
            &self.email,
            &self.first_name,
            &self.last_name,
            &self.password,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err("All required fields must be filled.");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Password must be at least 8 characters.");
        }
        if !is_valid_email(&self.email) {
            return Err("Invalid email address.");
        }
        match self.role.as_deref() {
            None => Ok(Role::User),
            Some(raw) => Role::parse_strict(raw).ok_or("Invalid role."),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: Option<String>,
}

/// UserQuery
///
/// Query parameters of `GET /api/superadmin/users`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct UserQuery {
    /// Case-insensitive match on first name, last name, email or username.
    pub search: Option<String>,
    /// `superadmin`, `admin`, `user`, or `all`.
    pub role: Option<String>,
}

impl UserQuery {
    pub fn into_filter(self) -> Result<UserListFilter, &'static str> {
        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let role = match self.role.as_deref() {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(Role::parse_strict(raw).ok_or("Invalid role filter.")?),
        };
        Ok(UserListFilter { search, role })
    }
}

// --- Response Schemas ---

#[derive(Debug, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserEnvelope {
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RoleUpdated {
    pub success: bool,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `local@domain` with no whitespace, exactly one `@`, and some `.` in the
/// domain that has text on both sides of it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .match_indices('.')
        .any(|(i, _)| i > 0 && i + 1 < domain.len())
}
