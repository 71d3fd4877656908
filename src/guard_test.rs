use super::*;

use uuid::Uuid;

use crate::types::{AuthUser, Profile};

fn signed_in(role: Option<Role>) -> CoordinatorState {
    let user = AuthUser { id: Uuid::new_v4(), email: Some("a@b.com".into()) };
    let profile = role.map(|role| Profile {
        id: Uuid::new_v4(),
        user_id: user.id,
        first_name: "Ana".into(),
        last_name: "Ruiz".into(),
        role,
        email: user.email.clone(),
        avatar_url: None,
        created_at: None,
        updated_at: None,
    });
    CoordinatorState { user: Some(user), profile, loading: false, error: None }
}

// =============================================================================
// route_access
// =============================================================================

#[test]
fn loading_wins_over_everything() {
    let mut state = signed_in(Some(Role::Student));
    state.loading = true;
    assert_eq!(route_access(&state, &[Role::Teacher]), RouteAccess::Loading);
    assert_eq!(RouteAccess::Loading.redirect_path(), None);
}

#[test]
fn anonymous_goes_to_login() {
    let state = CoordinatorState::default();
    let access = route_access(&state, &[]);
    assert_eq!(access, RouteAccess::RedirectToLogin);
    assert_eq!(access.redirect_path(), Some("/login"));
}

#[test]
fn missing_profile_goes_to_completion() {
    let access = route_access(&signed_in(None), &[Role::Student]);
    assert_eq!(access, RouteAccess::RedirectToCompleteProfile);
    assert_eq!(access.redirect_path(), Some("/complete-profile"));
}

#[test]
fn wrong_role_is_unauthorized() {
    let access = route_access(&signed_in(Some(Role::Student)), &[Role::Teacher]);
    assert_eq!(access, RouteAccess::Unauthorized);
    assert_eq!(access.redirect_path(), Some("/unauthorized"));
}

#[test]
fn matching_or_unrestricted_role_is_allowed() {
    let state = signed_in(Some(Role::Teacher));
    assert_eq!(route_access(&state, &[Role::Teacher]), RouteAccess::Allowed);
    assert_eq!(route_access(&state, &[]), RouteAccess::Allowed);
}

// =============================================================================
// dashboard_redirect
// =============================================================================

#[test]
fn dashboard_follows_role() {
    assert_eq!(dashboard_redirect(&signed_in(Some(Role::Student))), Ok("/student-dashboard"));
    assert_eq!(dashboard_redirect(&signed_in(Some(Role::Teacher))), Ok("/teacher-dashboard"));
}

#[test]
fn dashboard_without_profile_reports_access() {
    assert_eq!(dashboard_redirect(&signed_in(None)), Err(RouteAccess::RedirectToCompleteProfile));
    assert_eq!(dashboard_redirect(&CoordinatorState::initializing()), Err(RouteAccess::Loading));
}
