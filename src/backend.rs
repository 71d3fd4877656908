//! Collaborator contracts the coordinator depends on.
//!
//! DESIGN
//! ======
//! Both traits are object-safe via `async_trait` so the coordinator can hold
//! them as `Arc<dyn ...>` and tests can inject scripted mocks.

use tokio::sync::watch;
use uuid::Uuid;

use crate::error::BackendError;
use crate::types::{AuthResponse, NewProfile, Profile, ProfileUpdate, Session};

/// Hosted auth service.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Return the current session, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the session cannot be retrieved.
    async fn get_session(&self) -> Result<Option<Session>, BackendError>;

    /// Subscribe to session changes.
    ///
    /// The receiver's current value is unseen on return, so the first
    /// `changed()` resolves immediately with the session at subscription time.
    fn on_session_change(&self) -> watch::Receiver<Option<Session>>;

    /// Request account creation; `redirect_to` is the email confirmation target.
    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<AuthResponse, BackendError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthResponse, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Send a password-reset email that links back to `redirect_to`.
    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), BackendError>;

    /// Change the signed-in principal's password.
    async fn update_credential(&self, new_password: &str) -> Result<(), BackendError>;
}

/// Hosted profile table.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Look up the profile for `user_id`. `Ok(None)` means not yet onboarded.
    async fn get_profile_for(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError>;

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, BackendError>;

    async fn update_profile(&self, profile_id: Uuid, update: &ProfileUpdate) -> Result<Profile, BackendError>;
}
