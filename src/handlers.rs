use crate::{
    AppState,
    auth::SessionUser,
    errors::ApiError,
    models::{
        NewUser, PublicUser, RoleUpdated, SignInRequest, SignUpRequest, SuccessResponse,
        UpdateRoleRequest, UserEnvelope, UserQuery, UsersResponse,
    },
    navigation::{NavigationQuery, NavigationResponse, navigation_for},
    password,
    session::{Role, SessionClaims, SessionIdentity, clear_session_cookie, session_cookie},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// MeResponse
///
/// Body of the "who am I" endpoint. `user` is null without a session.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: Option<SessionClaims>,
}

/// start_session
///
/// Issues a token for `user` and wraps `body` in a response that installs
/// the session cookie.
fn start_session<T: Serialize>(
    state: &AppState,
    user: &PublicUser,
    status: StatusCode,
    body: T,
) -> Result<Response, ApiError> {
    let token = state.keys.issue(&SessionIdentity {
        user_id: i64::from(user.id),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        role: user.role,
    })?;
    let cookie = session_cookie(&token, state.keys.ttl_secs(), state.config.secure_cookies());
    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

// --- Authentication Handlers ---

/// sign_in
///
/// [Bypass Route] Authenticates by username OR email and starts a session.
///
/// The password is checked before the account state, so a disabled account
/// is only revealed to someone who already knows its password.
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = UserEnvelope),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account disabled")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Response, ApiError> {
    let login = payload.username.trim();
    if login.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required."));
    }

    let invalid = || ApiError::Unauthorized("Invalid credentials.".to_string());

    let account = state.repo.find_by_login(login).await?.ok_or_else(invalid)?;

    // Argon2 is deliberately slow; keep it off the async workers.
    let candidate = payload.password;
    let stored = account.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || password::verify(&candidate, &stored)).await?;
    if !matches {
        tracing::info!(user_id = account.id, "sign-in rejected: bad password");
        return Err(invalid());
    }

    if !account.is_active {
        return Err(ApiError::Forbidden(
            "Account is disabled. Contact your administrator.".to_string(),
        ));
    }

    state.repo.touch_last_login(account.id).await?;
    tracing::info!(user_id = account.id, role = %account.role, "signed in");

    let user = PublicUser::from(&account);
    start_session(&state, &user, StatusCode::OK, UserEnvelope { user: user.clone() })
}

/// sign_up
///
/// [Bypass Route] Registers an account.
///
/// Anyone may register as `user`. Requesting `admin` or `superadmin`
/// requires the caller to already hold a superadmin session. A superadmin
/// caller creates the account on someone else's behalf and keeps their own
/// session; every other successful sign-up starts a session for the new
/// account.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Registered", body = UserEnvelope),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Elevated role requested without superadmin session"),
        (status = 409, description = "Username or email taken")
    )
)]
pub async fn sign_up(
    caller: Option<SessionUser>,
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<Response, ApiError> {
    let role = payload.validate().map_err(ApiError::bad_request)?;

    let caller_is_superadmin = caller.is_some_and(|c| c.role() == Role::Superadmin);
    if role != Role::User && !caller_is_superadmin {
        return Err(ApiError::Forbidden(
            "Only a superadmin can assign elevated roles.".to_string(),
        ));
    }

    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();
    if state.repo.exists(&username, &email).await? {
        return Err(ApiError::Conflict("Username or email already exists.".to_string()));
    }

    let plain = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash(&plain)).await??;

    let account = state
        .repo
        .create_user(NewUser {
            username,
            email,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            password_hash,
            role,
            phone: payload.phone.filter(|p| !p.trim().is_empty()),
        })
        .await?;
    tracing::info!(user_id = account.id, role = %account.role, "account created");

    let user = PublicUser::from(&account);
    let body = UserEnvelope { user: user.clone() };
    if caller_is_superadmin {
        Ok((StatusCode::CREATED, Json(body)).into_response())
    } else {
        start_session(&state, &user, StatusCode::CREATED, body)
    }
}

/// logout
///
/// [Bypass Route] Deletes the session cookie. Idempotent.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out", body = SuccessResponse))
)]
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = clear_session_cookie(state.config.secure_cookies());
    (
        [(header::SET_COOKIE, cookie)],
        Json(SuccessResponse { success: true }),
    )
        .into_response()
}

/// logout_redirect
///
/// [Bypass Route] Browser variant of logout: clears the cookie and sends the
/// user to the login page.
#[utoipa::path(
    get,
    path = "/api/auth/logout",
    responses((status = 303, description = "Redirect to login"))
)]
pub async fn logout_redirect(State(state): State<AppState>) -> Response {
    let cookie = clear_session_cookie(state.config.secure_cookies());
    let target = format!("{}/login", state.config.app_url.trim_end_matches('/'));
    ([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response()
}

/// me
///
/// [Bypass Route] Echoes the verified claim set. Bypassed by the route guard
/// so the shell can poll it without redirect loops.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current session", body = MeResponse),
        (status = 401, description = "No session", body = MeResponse)
    )
)]
pub async fn me(session: Option<SessionUser>) -> Response {
    match session {
        Some(SessionUser(claims)) => Json(MeResponse { user: Some(claims) }).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(MeResponse { user: None })).into_response(),
    }
}

/// navigation
///
/// [Authenticated Route] The sidebar entries this session may follow, plus
/// the page title for `path`.
#[utoipa::path(
    get,
    path = "/api/navigation",
    params(NavigationQuery),
    responses((status = 200, description = "Menu", body = NavigationResponse))
)]
pub async fn navigation(
    session: SessionUser,
    State(state): State<AppState>,
    Query(query): Query<NavigationQuery>,
) -> Json<NavigationResponse> {
    let path = query.path.unwrap_or_else(|| "/".to_string());
    Json(navigation_for(&state.routes, session.role(), &path))
}

// --- User Management Handlers (Superadmin) ---

/// list_users
///
/// [Superadmin Route] Lists accounts, newest first, with optional search and
/// role filter.
#[utoipa::path(
    get,
    path = "/api/superadmin/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Accounts", body = UsersResponse),
        (status = 400, description = "Invalid role filter"),
        (status = 401, description = "Not a superadmin")
    )
)]
pub async fn list_users(
    session: SessionUser,
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UsersResponse>, ApiError> {
    session.require_superadmin()?;
    let filter = query.into_filter().map_err(ApiError::bad_request)?;
    let users = state.repo.list_users(&filter).await?;
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

/// update_user_role
///
/// [Superadmin Route] Changes an account's role. A superadmin cannot demote
/// themselves, which keeps at least the acting account in charge.
#[utoipa::path(
    patch,
    path = "/api/superadmin/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = RoleUpdated),
        (status = 400, description = "Invalid role or self-demotion"),
        (status = 401, description = "Not a superadmin"),
        (status = 404, description = "No such user")
    )
)]
pub async fn update_user_role(
    session: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<RoleUpdated>, ApiError> {
    session.require_superadmin()?;

    let role = payload
        .role
        .as_deref()
        .and_then(Role::parse_strict)
        .ok_or_else(|| ApiError::bad_request("Invalid role. Allowed: superadmin, admin, user"))?;

    if session.user_id() == i64::from(id) && role != Role::Superadmin {
        return Err(ApiError::bad_request("You cannot change your own role."));
    }

    let stored = state
        .repo
        .update_role(id, role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;
    tracing::info!(actor = session.user_id(), target = id, role = %stored, "role changed");

    Ok(Json(RoleUpdated {
        success: true,
        role: stored,
    }))
}

/// delete_user
///
/// [Superadmin Route] Removes an account. Self-deletion is refused.
#[utoipa::path(
    delete,
    path = "/api/superadmin/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = SuccessResponse),
        (status = 400, description = "Self-deletion"),
        (status = 401, description = "Not a superadmin"),
        (status = 404, description = "No such user")
    )
)]
pub async fn delete_user(
    session: SessionUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    session.require_superadmin()?;

    if session.user_id() == i64::from(id) {
        return Err(ApiError::bad_request("You cannot delete your own account."));
    }

    if !state.repo.delete_user(id).await? {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }
    tracing::info!(actor = session.user_id(), target = id, "account deleted");

    Ok(Json(SuccessResponse { success: true }))
}
