/// Router Module Index
///
/// Groups the JSON API by who may call it. Page-level protection is done once
/// for the whole router by `access::route_guard`; the handlers in these
/// modules additionally check the session themselves where it matters.

/// Health check and the session lifecycle endpoints (bypassed by the guard).
pub mod public;

/// Endpoints for any signed-in principal.
pub mod authenticated;

/// User management, restricted to the `superadmin` role.
pub mod superadmin;
