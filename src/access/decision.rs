use reqwest::Url;

use super::table::{RouteCategory, RouteTable};
use crate::session::{Role, SessionKeys};

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Query parameter the login flow reads to bounce the user back.
pub const RETURN_TO_PARAM: &str = "redirect";

// Only used to borrow Url's path joining and query encoding.
const LOCATION_BASE: &str = "http://portal.local";

/// Access
///
/// The outcome of guarding one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Proceed,
    RedirectTo(&'static str),
    RedirectWithReturnTo {
        login: &'static str,
        return_to: String,
    },
}

impl Access {
    /// The `Location` header for a redirect, `None` for `Proceed`.
    pub fn location(&self) -> Option<String> {
        match self {
            Access::Proceed => None,
            Access::RedirectTo(target) => Some((*target).to_string()),
            Access::RedirectWithReturnTo { login, return_to } => {
                Some(login_location(login, return_to))
            }
        }
    }
}

fn login_location(login: &str, return_to: &str) -> String {
    match Url::parse(LOCATION_BASE).and_then(|base| base.join(login)) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair(RETURN_TO_PARAM, return_to);
            match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            }
        }
        Err(_) => login.to_string(),
    }
}

/// decide
///
/// The decision table. `session` is the role of a verified session, or
/// `None` when the request carries no valid token. Every arm is explicit;
/// nothing reaches `Proceed` by falling through.
pub fn decide(category: RouteCategory, session: Option<Role>, path: &str) -> Access {
    let login = || Access::RedirectWithReturnTo {
        login: LOGIN_PATH,
        return_to: path.to_string(),
    };

    match (category, session) {
        (RouteCategory::Bypass, _) => Access::Proceed,

        (RouteCategory::AuthOnly, Some(_)) => Access::RedirectTo(ROOT_PATH),
        (RouteCategory::AuthOnly, None) => Access::Proceed,

        (RouteCategory::Public, _) => Access::Proceed,

        (RouteCategory::SuperadminOnly, None) => login(),
        (RouteCategory::SuperadminOnly, Some(Role::Superadmin)) => Access::Proceed,
        (RouteCategory::SuperadminOnly, Some(Role::Admin | Role::User)) => {
            Access::RedirectTo(UNAUTHORIZED_PATH)
        }

        (RouteCategory::AdminTier, None) => login(),
        (RouteCategory::AdminTier, Some(Role::Superadmin | Role::Admin)) => Access::Proceed,
        (RouteCategory::AdminTier, Some(Role::User)) => Access::RedirectTo(UNAUTHORIZED_PATH),

        (RouteCategory::Authenticated, None) => login(),
        (RouteCategory::Authenticated, Some(_)) => Access::Proceed,
    }
}

/// evaluate
///
/// Classifies `path`, verifies `token` and decides. Bypass routes never
/// touch the token.
pub fn evaluate(table: &RouteTable, keys: &SessionKeys, path: &str, token: Option<&str>) -> Access {
    let category = table.classify(path);
    if category == RouteCategory::Bypass {
        return Access::Proceed;
    }
    let role = token.and_then(|t| keys.verify(t)).map(|claims| claims.role);
    decide(category, role, path)
}
