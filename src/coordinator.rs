//! Session coordinator: who is signed in, and what is their profile.
//!
//! ARCHITECTURE
//! ============
//! Two sources report the session: the one-shot fetch at startup and the
//! backend's change stream. Both funnel into the same `track_user` path,
//! which sets `user` and then looks the profile up. Last write wins.
//!
//! `{user, profile, loading, error}` plus the liveness flag sit behind one
//! mutex, never held across an `.await`. Every mutation goes through
//! `Inner::mutate`, which checks liveness under that lock, so nothing
//! lands after `dispose`. Each mutation publishes a snapshot on a `watch`
//! channel for consumers.
//!
//! LOADING
//! =======
//! `loading` clears exactly once: on session-fetch failure, or once the
//! first change notification has been fully handled and every profile
//! lookup started while loading has settled.
//!
//! TRADE-OFFS
//! ==========
//! A failed profile lookup leaves `profile` empty with `error` set, which
//! reads the same as "signed in, not onboarded". The UI routes both to
//! profile completion.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::{AuthBackend, ProfileStore};
use crate::config::Redirects;
use crate::error::{AuthError, ErrorCode, LookupError, ProfileError, SessionError};
use crate::types::{AuthResponse, AuthUser, CoordinatorState, NewProfile, Profile, ProfileUpdate, Role, Session, SignUpOutcome};

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Handle to the task draining the backend's session-change stream.
///
/// Cancelled explicitly by [`Subscription::cancel`] or on drop.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Stop receiving notifications. Idempotent.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// =============================================================================
// SHARED STATE
// =============================================================================

struct Shared {
    state: CoordinatorState,
    live: bool,
    first_notification_done: bool,
    /// Profile lookups started while `loading` was still true.
    pending_lookups: usize,
    subscription: Option<Subscription>,
    init_task: Option<JoinHandle<()>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: CoordinatorState::initializing(),
            live: true,
            first_notification_done: false,
            pending_lookups: 0,
            subscription: None,
            init_task: None,
        }
    }

    fn clear_user(&mut self) {
        self.state.user = None;
        self.state.profile = None;
    }

    fn current_user_id(&self) -> Option<Uuid> {
        self.state.user.as_ref().map(|u| u.id)
    }
}

struct Inner {
    auth: Arc<dyn AuthBackend>,
    profiles: Arc<dyn ProfileStore>,
    redirects: Redirects,
    shared: Mutex<Shared>,
    snapshots: watch::Sender<CoordinatorState>,
    disposed: Notify,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` if the coordinator is still live, then publish a snapshot.
    /// Returns false when disposed.
    fn mutate(&self, f: impl FnOnce(&mut Shared)) -> bool {
        let mut shared = self.lock();
        if !shared.live {
            return false;
        }
        f(&mut shared);
        if shared.state.loading && shared.first_notification_done && shared.pending_lookups == 0 {
            shared.state.loading = false;
            info!(authenticated = shared.state.user.is_some(), "session resolved");
        }
        debug_assert!(shared.state.user.is_some() || shared.state.profile.is_none());
        self.snapshots.send_replace(shared.state.clone());
        true
    }

    fn record_error(&self, message: String) {
        self.mutate(|shared| shared.state.error = Some(message));
    }

    fn fail_auth(&self, action: &'static str, e: AuthError) -> AuthError {
        error!(action, code = e.error_code(), error = %e, "auth action failed");
        self.record_error(e.to_string());
        e
    }

    async fn initialize(self: Arc<Self>) {
        let session = match self.auth.get_session().await {
            Ok(session) => session,
            Err(e) => {
                let e = SessionError::from(e);
                error!(error = %e, "session fetch failed");
                self.mutate(|shared| {
                    shared.state.error = Some(e.to_string());
                    shared.state.loading = false;
                });
                return;
            }
        };

        // The startup lookup is counted before the listener exists, so the
        // first notification cannot clear loading ahead of it.
        let lookup = match session {
            Some(session) => match self.begin_tracking(session.user) {
                Some(lookup) => Some(lookup),
                None => return,
            },
            None => {
                if !self.mutate(Shared::clear_user) {
                    return;
                }
                None
            }
        };

        let changes = self.auth.on_session_change();
        let subscription = Subscription::new(tokio::spawn(Arc::clone(&self).listen(changes)));
        {
            let mut shared = self.lock();
            if !shared.live {
                return;
            }
            shared.subscription = Some(subscription);
        }

        if let Some((user_id, counted)) = lookup {
            self.finish_lookup(user_id, counted).await;
        }
    }

    async fn listen(self: Arc<Self>, mut changes: watch::Receiver<Option<Session>>) {
        while changes.changed().await.is_ok() {
            let session = changes.borrow_and_update().clone();
            match session {
                Some(session) => {
                    debug!(user_id = %session.user.id, "session changed");
                    self.track_user(session.user).await;
                }
                None => {
                    debug!("session cleared");
                    self.mutate(Shared::clear_user);
                }
            }
            self.mutate(|shared| shared.first_notification_done = true);
        }
        debug!("session change stream closed");
        self.mutate(|shared| shared.first_notification_done = true);
    }

    /// Set `user`, then attempt the profile lookup for it.
    async fn track_user(&self, user: AuthUser) {
        if let Some((user_id, counted)) = self.begin_tracking(user) {
            self.finish_lookup(user_id, counted).await;
        }
    }

    /// Set `user` and count its lookup if still loading. `None` when disposed.
    fn begin_tracking(&self, user: AuthUser) -> Option<(Uuid, bool)> {
        let user_id = user.id;
        let mut counted = false;
        let live = self.mutate(|shared| {
            if shared.current_user_id() != Some(user_id) {
                shared.state.profile = None;
            }
            shared.state.user = Some(user);
            if shared.state.loading {
                shared.pending_lookups += 1;
                counted = true;
            }
        });
        live.then_some((user_id, counted))
    }

    async fn finish_lookup(&self, user_id: Uuid, counted: bool) {
        let result = self.profiles.get_profile_for(user_id).await.map_err(LookupError::from);
        if let Err(e) = &result {
            error!(%user_id, error = %e, "profile fetch failed");
        }

        self.mutate(|shared| {
            if counted {
                shared.pending_lookups = shared.pending_lookups.saturating_sub(1);
            }
            match result {
                Ok(profile) if shared.current_user_id() == Some(user_id) => shared.state.profile = profile,
                Ok(_) => debug!(%user_id, "discarding profile for user no longer signed in"),
                Err(e) => shared.state.error = Some(e.to_string()),
            }
        });
    }
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// Owns the session/profile state for one application scope.
///
/// Created with [`SessionCoordinator::start`], torn down with
/// [`SessionCoordinator::dispose`] or on drop.
pub struct SessionCoordinator {
    inner: Arc<Inner>,
}

impl SessionCoordinator {
    /// Create the coordinator and begin resolving the session in the background.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(auth: Arc<dyn AuthBackend>, profiles: Arc<dyn ProfileStore>, redirects: Redirects) -> Self {
        let (snapshots, _) = watch::channel(CoordinatorState::initializing());
        let inner = Arc::new(Inner {
            auth,
            profiles,
            redirects,
            shared: Mutex::new(Shared::new()),
            snapshots,
            disposed: Notify::new(),
        });
        let init_task = tokio::spawn(Arc::clone(&inner).initialize());
        inner.lock().init_task = Some(init_task);
        Self { inner }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CoordinatorState {
        self.inner.lock().state.clone()
    }

    /// Receive a snapshot after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.snapshots.subscribe()
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.inner.lock().live
    }

    /// Wait for `loading` to clear. Returns `None` if disposed first.
    pub async fn ready(&self) -> Option<CoordinatorState> {
        let disposed = self.inner.disposed.notified();
        if !self.is_live() {
            return None;
        }
        let mut snapshots = self.subscribe();
        tokio::select! {
            resolved = snapshots.wait_for(|state| !state.loading) => resolved.ok().map(|state| (*state).clone()),
            () = disposed => None,
        }
    }

    /// Cancel the change subscription and freeze the state. Idempotent.
    pub fn dispose(&self) {
        let (subscription, init_task) = {
            let mut shared = self.inner.lock();
            if !shared.live {
                return;
            }
            shared.live = false;
            (shared.subscription.take(), shared.init_task.take())
        };
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
        if let Some(init_task) = init_task {
            init_task.abort();
        }
        self.inner.disposed.notify_waiters();
        debug!("session coordinator disposed");
    }

    /// Replace the cached profile without a round trip.
    ///
    /// Ignored when it would attach a profile to no user, or to a different user.
    pub fn set_profile(&self, profile: Option<Profile>) {
        self.inner.mutate(|shared| {
            let current = shared.current_user_id();
            match profile {
                None => shared.state.profile = None,
                Some(p) if current == Some(p.user_id) => shared.state.profile = Some(p),
                Some(p) => warn!(profile_user = %p.user_id, current_user = ?current, "ignoring profile for another user"),
            }
        });
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Request account creation. No state change on success.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AlreadyRegistered`] for duplicate emails, otherwise
    /// the backend's message.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let redirect_to = &self.inner.redirects.email_confirmation;
        match self.inner.auth.sign_up(email, password, redirect_to).await {
            Ok(response) => {
                let needs_email_verification = response.session.is_none();
                info!(needs_email_verification, "sign-up accepted");
                Ok(SignUpOutcome { needs_email_verification, response })
            }
            Err(e) => Err(self.inner.fail_auth("sign-up", AuthError::from_sign_up(e))),
        }
    }

    /// Validate credentials, then track the returned user and look up their profile.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for bad credentials, otherwise
    /// the backend's message.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let response = match self.inner.auth.sign_in_with_password(email, password).await {
            Ok(response) => response,
            Err(e) => return Err(self.inner.fail_auth("sign-in", AuthError::from_sign_in(e))),
        };

        let user = response
            .user
            .clone()
            .or_else(|| response.session.as_ref().map(|s| s.user.clone()));
        if let Some(user) = user {
            info!(user_id = %user.id, "signed in");
            self.inner.track_user(user).await;
        }
        Ok(response)
    }

    /// Invalidate the backend session and clear `user`, `profile` and `error`.
    ///
    /// # Errors
    ///
    /// Returns the backend's message; state is left unchanged apart from `error`.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Err(e) = self.inner.auth.sign_out().await {
            return Err(self.inner.fail_auth("sign-out", e.into()));
        }
        self.inner.mutate(|shared| {
            shared.clear_user();
            shared.state.error = None;
        });
        info!("signed out");
        Ok(())
    }

    /// Ask the backend to email a password-reset link.
    ///
    /// # Errors
    ///
    /// Returns the backend's message.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let redirect_to = &self.inner.redirects.password_reset;
        if let Err(e) = self.inner.auth.send_password_reset(email, redirect_to).await {
            return Err(self.inner.fail_auth("reset-password", e.into()));
        }
        Ok(())
    }

    /// Change the signed-in user's password. Session identity is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the backend's message.
    pub async fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        if let Err(e) = self.inner.auth.update_credential(new_password).await {
            return Err(self.inner.fail_auth("update-password", e.into()));
        }
        Ok(())
    }

    // =========================================================================
    // PROFILE COMPLETION
    // =========================================================================

    /// Create the signed-in user's profile and cache it.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotSignedIn`] without a user,
    /// [`ProfileError::AlreadyOnboarded`] when a profile is already cached,
    /// a validation error for blank names, or the store's failure.
    pub async fn complete_profile(
        &self,
        first_name: &str,
        last_name: &str,
        role: Role,
        avatar_url: Option<String>,
    ) -> Result<Profile, ProfileError> {
        let state = self.snapshot();
        let user = state.user.ok_or(ProfileError::NotSignedIn)?;
        if state.profile.is_some() {
            warn!(user_id = %user.id, "profile already completed");
            return Err(ProfileError::AlreadyOnboarded);
        }
        let new_profile = NewProfile {
            user_id: user.id,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            role,
            email: user.email,
            avatar_url,
        }
        .validate()?;

        let profile = self
            .inner
            .profiles
            .create_profile(&new_profile)
            .await
            .inspect_err(|e| error!(user_id = %user.id, error = %e, "profile creation failed"))?;
        info!(user_id = %user.id, role = %profile.role, "profile created");
        self.set_profile(Some(profile.clone()));
        Ok(profile)
    }

    /// Patch the cached profile in the store and cache the result.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotSignedIn`] when no profile is cached, or the store's failure.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, ProfileError> {
        let current = self.snapshot().profile.ok_or(ProfileError::NotSignedIn)?;
        let profile = self
            .inner
            .profiles
            .update_profile(current.id, update)
            .await
            .inspect_err(|e| error!(profile_id = %current.id, error = %e, "profile update failed"))?;
        self.set_profile(Some(profile.clone()));
        Ok(profile)
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
