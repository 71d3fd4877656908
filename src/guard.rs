//! Route access decisions over a coordinator snapshot.

use crate::types::{CoordinatorState, Role};

pub const LOGIN_PATH: &str = "/login";
pub const COMPLETE_PROFILE_PATH: &str = "/complete-profile";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Session not resolved yet; show a loading screen.
    Loading,
    RedirectToLogin,
    /// Signed in but not onboarded.
    RedirectToCompleteProfile,
    /// Profile role is not in the route's allow-list.
    Unauthorized,
    Allowed,
}

impl RouteAccess {
    /// Redirect target, or `None` when the route renders in place.
    #[must_use]
    pub fn redirect_path(self) -> Option<&'static str> {
        match self {
            Self::Loading | Self::Allowed => None,
            Self::RedirectToLogin => Some(LOGIN_PATH),
            Self::RedirectToCompleteProfile => Some(COMPLETE_PROFILE_PATH),
            Self::Unauthorized => Some(UNAUTHORIZED_PATH),
        }
    }
}

/// Decide whether a protected route may render. An empty `allowed_roles` admits any role.
#[must_use]
pub fn route_access(state: &CoordinatorState, allowed_roles: &[Role]) -> RouteAccess {
    if state.loading {
        return RouteAccess::Loading;
    }
    if state.user.is_none() {
        return RouteAccess::RedirectToLogin;
    }
    let Some(profile) = &state.profile else {
        return RouteAccess::RedirectToCompleteProfile;
    };
    if !allowed_roles.is_empty() && !allowed_roles.contains(&profile.role) {
        return RouteAccess::Unauthorized;
    }
    RouteAccess::Allowed
}

/// Where the generic `/dashboard` entry point sends the user.
#[must_use]
pub fn dashboard_redirect(state: &CoordinatorState) -> Result<&'static str, RouteAccess> {
    match (route_access(state, &[]), &state.profile) {
        (RouteAccess::Allowed, Some(profile)) => Ok(profile.role.dashboard_path()),
        (access, _) => Err(access),
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
