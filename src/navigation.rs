//! Role-gated navigation shell.
//!
//! The sidebar menu is derived from the same route table the guard enforces,
//! so a link is only offered when following it would not be redirected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::access::{Access, RouteTable, decide};
use crate::session::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub path: &'static str,
}

pub const DEFAULT_LABEL: &str = "Dashboard";

pub const MENU: [MenuEntry; 5] = [
    MenuEntry { id: "home", label: "Dashboard", path: "/" },
    MenuEntry { id: "users", label: "Users", path: "/users" },
    MenuEntry { id: "agents", label: "Agents", path: "/agents" },
    MenuEntry { id: "warehouses", label: "Warehouses", path: "/warehouses" },
    MenuEntry { id: "settings", label: "Settings", path: "/settings" },
];

/// The page title for `path`: an exact menu match, else the first non-root
/// entry whose path prefixes it, else the dashboard.
pub fn active_label(path: &str) -> &'static str {
    MENU.iter()
        .find(|entry| entry.path == path)
        .or_else(|| {
            MENU.iter()
                .filter(|entry| entry.path != "/")
                .find(|entry| path.starts_with(entry.path))
        })
        .map(|entry| entry.label)
        .unwrap_or(DEFAULT_LABEL)
}

pub fn visible_entries(table: &RouteTable, role: Role) -> Vec<MenuEntry> {
    MENU.iter()
        .copied()
        .filter(|entry| {
            decide(table.classify(entry.path), Some(role), entry.path) == Access::Proceed
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavLink {
    pub id: String,
    pub label: String,
    pub path: String,
}

impl From<MenuEntry> for NavLink {
    fn from(entry: MenuEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            label: entry.label.to_string(),
            path: entry.path.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NavigationResponse {
    pub active_label: String,
    pub role: Role,
    pub items: Vec<NavLink>,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct NavigationQuery {
    /// Current page path. Defaults to `/`.
    pub path: Option<String>,
}

pub fn navigation_for(table: &RouteTable, role: Role, path: &str) -> NavigationResponse {
    NavigationResponse {
        active_label: active_label(path).to_string(),
        role,
        items: visible_entries(table, role).into_iter().map(NavLink::from).collect(),
    }
}
