use serde::Serialize;

/// RouteCategory
///
/// The protection class a request path falls into. Exactly one category is
/// assigned per path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCategory {
    /// Framework internals, auth API endpoints and static files. No checks.
    Bypass,
    /// Login/registration flows. Signed-in principals are sent home.
    AuthOnly,
    /// Reachable with or without a session.
    Public,
    /// Requires `superadmin` exactly.
    SuperadminOnly,
    /// Requires `admin` or `superadmin`.
    AdminTier,
    /// Requires any valid session. The fallback for unmatched paths.
    Authenticated,
}

/// RouteMatcher
///
/// How a single rule recognises a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatcher {
    /// The path equals the pattern.
    Exact(&'static str),
    /// The path equals the pattern or continues it with `/`.
    /// `/admin` matches `/admin` and `/admin/reports`, never `/administration`.
    Subtree(&'static str),
    /// Raw string prefix. Only for bypass entries that mirror framework
    /// mount points, where sibling matches are intended.
    StartsWith(&'static str),
    /// Any path containing a literal dot is served as a static file.
    StaticFile,
}

impl RouteMatcher {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RouteMatcher::Exact(p) => path == *p,
            RouteMatcher::Subtree(p) => match path.strip_prefix(p) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
            RouteMatcher::StartsWith(p) => path.starts_with(p),
            RouteMatcher::StaticFile => path.contains('.'),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub matcher: RouteMatcher,
    pub category: RouteCategory,
}

impl RouteRule {
    pub const fn new(matcher: RouteMatcher, category: RouteCategory) -> Self {
        Self { matcher, category }
    }
}

/// RouteTable
///
/// An ordered list of rules. Classification walks the list top to bottom and
/// the first matching rule wins; a path nothing matches is `Authenticated`,
/// so there is no way for an unlisted route to end up unprotected.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The portal's route table, in precedence order.
    pub fn standard() -> Self {
        use RouteCategory::*;
        use RouteMatcher::*;

        Self::new(vec![
            RouteRule::new(StartsWith("/_next"), Bypass),
            RouteRule::new(StartsWith("/api/auth/signin"), Bypass),
            RouteRule::new(StartsWith("/api/auth/signup"), Bypass),
            RouteRule::new(StartsWith("/api/auth/logout"), Bypass),
            RouteRule::new(StartsWith("/api/auth/me"), Bypass),
            RouteRule::new(Subtree("/swagger-ui"), Bypass),
            RouteRule::new(StaticFile, Bypass),
            RouteRule::new(Subtree("/login"), AuthOnly),
            RouteRule::new(Subtree("/register"), AuthOnly),
            RouteRule::new(Exact("/unauthorized"), Public),
            RouteRule::new(Exact("/health"), Public),
            RouteRule::new(Subtree("/admin"), SuperadminOnly),
            RouteRule::new(Subtree("/dashboard"), AdminTier),
            RouteRule::new(Subtree("/users"), AdminTier),
            RouteRule::new(Subtree("/settings"), AdminTier),
        ])
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn classify(&self, path: &str) -> RouteCategory {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map(|rule| rule.category)
            .unwrap_or(RouteCategory::Authenticated)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}
