/// Access Control Module Index
///
/// The request gatekeeper: every inbound path is classified against an
/// ordered route table, the session cookie (if any) is verified, and a pure
/// decision function turns the pair into proceed-or-redirect.

/// Ordered (matcher, category) rules and the path classifier.
pub mod table;

/// The total decision function over (category, session).
pub mod decision;

/// Axum middleware applying the decision to live requests.
pub mod guard;

pub use decision::{Access, decide, evaluate};
pub use guard::route_guard;
pub use table::{RouteCategory, RouteMatcher, RouteRule, RouteTable};
