//! Route guards.
//!
//! Guards are pure decisions over the session store's current state. They keep
//! no memory between navigations and never fail: anything that cannot be
//! decided falls through to a redirect.
//!
//! # Redirect priority
//!
//! | Situation | Destination |
//! |-----------|-------------|
//! | not logged in | `/login` |
//! | role not allowed, admin | `/admin` |
//! | role not allowed, staff | `/staff` |
//! | role not allowed, otherwise | `/` |

use std::fmt;

use tracing::debug;

use crate::session::SessionStore;
use crate::types::{Identity, Role};

/// Well-known destinations.
pub mod paths {
    pub const HOME: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const STAFF_HOME: &str = "/staff";
    pub const ADMIN_HOME: &str = "/admin";
}

/// Outcome of a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The requested view may render.
    Render,
    /// Navigate here instead.
    Redirect(&'static str),
}

impl GuardDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render)
    }
}

impl fmt::Display for GuardDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardDecision::Render => f.write_str("render"),
            GuardDecision::Redirect(target) => write!(f, "redirect {}", target),
        }
    }
}

/// Who may view a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Anyone,
    Authenticated,
    /// An empty slice means any authenticated user.
    Roles(&'static [Role]),
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Anyone => f.write_str("anyone"),
            Access::Authenticated | Access::Roles(&[]) => f.write_str("authenticated"),
            Access::Roles(roles) => {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

/// Static authorization rule for one path pattern.
///
/// `:name` segments match any single segment. A trailing `**` matches the
/// rest of the path, including nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRule {
    pub path: &'static str,
    pub access: Access,
}

impl RouteRule {
    pub const fn new(path: &'static str, access: Access) -> Self {
        Self { path, access }
    }

    /// Whether `path` (already normalized) matches this rule's pattern.
    pub fn matches(&self, path: &str) -> bool {
        let mut pattern = segments(self.path);
        let mut candidate = segments(path);
        loop {
            match (pattern.next(), candidate.next()) {
                (None, None) | (Some("**"), _) => return true,
                (Some(p), Some(c)) if p.starts_with(':') || p == c => continue,
                _ => return false,
            }
        }
    }

    /// Apply this rule to the current session.
    pub fn check(&self, session: &SessionStore) -> GuardDecision {
        match self.access {
            Access::Anyone => GuardDecision::Render,
            Access::Authenticated | Access::Roles(&[]) => require_authenticated(session),
            Access::Roles(allowed) => require_roles(session, allowed),
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

const STAFF_OR_ADMIN: &[Role] = &[Role::Staff, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Route table for the activity portal.
pub const ROUTES: &[RouteRule] = &[
    RouteRule::new("/", Access::Anyone),
    RouteRule::new("/login", Access::Anyone),
    RouteRule::new("/activities", Access::Anyone),
    RouteRule::new("/activities/:id", Access::Anyone),
    RouteRule::new("/profile", Access::Authenticated),
    RouteRule::new("/my-activities", Access::Authenticated),
    RouteRule::new("/activities/:id/register", Access::Authenticated),
    RouteRule::new("/staff", Access::Roles(STAFF_OR_ADMIN)),
    RouteRule::new("/staff/activities", Access::Roles(STAFF_OR_ADMIN)),
    RouteRule::new("/staff/activities/new", Access::Roles(STAFF_OR_ADMIN)),
    RouteRule::new("/staff/activities/:id/edit", Access::Roles(STAFF_OR_ADMIN)),
    RouteRule::new("/admin", Access::Roles(ADMIN_ONLY)),
    RouteRule::new("/admin/users", Access::Roles(ADMIN_ONLY)),
    RouteRule::new("/admin/approvals", Access::Roles(ADMIN_ONLY)),
    // Section fallbacks, after every exact rule.
    RouteRule::new("/staff/**", Access::Roles(STAFF_OR_ADMIN)),
    RouteRule::new("/admin/**", Access::Roles(ADMIN_ONLY)),
];

/// Canonical form used for matching.
///
/// Drops query and fragment, lowercases, collapses empty and `.` segments and
/// resolves `..` (never above the root).
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let mut resolved: Vec<String> = Vec::new();
    for segment in path.trim().split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                resolved.pop();
            }
            other => resolved.push(other.to_ascii_lowercase()),
        }
    }
    format!("/{}", resolved.join("/"))
}

/// Find the rule in force for `path`: the first table entry that matches.
pub fn find_rule(path: &str) -> Option<&'static RouteRule> {
    let normalized = normalize_path(path);
    ROUTES.iter().find(|rule| rule.matches(&normalized))
}

/// Default landing page for a role that was refused a view.
pub fn home_for(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Admin) => paths::ADMIN_HOME,
        Some(Role::Staff) => paths::STAFF_HOME,
        _ => paths::HOME,
    }
}

/// Pure form of [`require_authenticated`].
pub fn decide_authenticated(identity: Option<&Identity>) -> GuardDecision {
    match identity {
        Some(_) => GuardDecision::Render,
        None => GuardDecision::Redirect(paths::LOGIN),
    }
}

/// Pure form of [`require_roles`].
pub fn decide_roles(identity: Option<&Identity>, allowed: &[Role]) -> GuardDecision {
    let Some(identity) = identity else {
        return GuardDecision::Redirect(paths::LOGIN);
    };
    if allowed.contains(&identity.role) {
        GuardDecision::Render
    } else {
        GuardDecision::Redirect(home_for(Some(identity.role)))
    }
}

/// Any logged-in user may view.
pub fn require_authenticated(session: &SessionStore) -> GuardDecision {
    decide_authenticated(session.identity())
}

/// Only the listed roles may view.
pub fn require_roles(session: &SessionStore, allowed: &[Role]) -> GuardDecision {
    decide_roles(session.identity(), allowed)
}

/// Decide a navigation to `path` using the route table.
///
/// Paths outside every rule and section are public.
pub fn evaluate(session: &SessionStore, path: &str) -> GuardDecision {
    let decision = match find_rule(path) {
        Some(rule) => rule.check(session),
        None => GuardDecision::Render,
    };
    debug!(path, decision = %decision, "route guard");
    decision
}
