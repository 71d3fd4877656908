//! EnglishQuest session coordination.
//!
//! ARCHITECTURE
//! ============
//! The `coordinator` owns the "who is logged in and what is their profile"
//! state. It talks to two collaborators through the traits in `backend`:
//! an auth service and a profile store. `supabase` implements both against
//! the hosted REST APIs; tests substitute in-memory mocks.
//!
//! `guard` turns a state snapshot into the route decision the UI applies.

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod guard;
pub mod supabase;
pub mod types;

pub use backend::{AuthBackend, ProfileStore};
pub use config::{Redirects, SupabaseConfig};
pub use coordinator::{SessionCoordinator, Subscription};
pub use error::{AuthError, BackendError, LookupError, ProfileError, SessionError};
pub use guard::{RouteAccess, dashboard_redirect, route_access};
pub use types::{AuthResponse, AuthUser, CoordinatorState, NewProfile, Profile, ProfileUpdate, Role, Session, SignUpOutcome};
