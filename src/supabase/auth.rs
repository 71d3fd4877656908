//! GoTrue auth endpoints behind the [`AuthBackend`] contract.

use reqwest::Method;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::SupabaseClient;
use crate::backend::AuthBackend;
use crate::error::BackendError;
use crate::types::{AuthResponse, AuthUser, Session};

const SESSION_MISSING: &str = "Auth session missing!";

pub struct SupabaseAuth {
    client: SupabaseClient,
    session: watch::Sender<Option<Session>>,
}

impl SupabaseAuth {
    #[must_use]
    pub fn new(client: SupabaseClient) -> Self {
        let (session, _) = watch::channel(None);
        Self { client, session }
    }

    /// Live view of the held session; does not mark the current value unseen.
    #[must_use]
    pub fn session_receiver(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    fn access_token(&self) -> Option<String> {
        self.session.borrow().as_ref().map(|s| s.access_token.clone())
    }

    fn publish(&self, session: Option<Session>) {
        self.session.send_replace(session);
    }
}

#[async_trait::async_trait]
impl AuthBackend for SupabaseAuth {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        Ok(self.session.borrow().clone())
    }

    fn on_session_change(&self) -> watch::Receiver<Option<Session>> {
        let mut changes = self.session.subscribe();
        changes.mark_changed();
        changes
    }

    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> Result<AuthResponse, BackendError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/signup", None)
            .query(&[("redirect_to", redirect_to)])
            .json(&serde_json::json!({ "email": email, "password": password }));
        let body = SupabaseClient::send(request).await?;
        let response = parse_auth_response(&body)?;
        if let Some(session) = &response.session {
            self.publish(Some(session.clone()));
        }
        Ok(response)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthResponse, BackendError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }));
        let body = SupabaseClient::send(request).await?;
        let response = parse_auth_response(&body)?;
        if response.session.is_none() {
            return Err(BackendError::new("sign-in response carried no session"));
        }
        self.publish(response.session.clone());
        Ok(response)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let Some(token) = self.access_token() else {
            self.publish(None);
            return Ok(());
        };
        let request = self.client.request(Method::POST, "/auth/v1/logout", Some(&token));
        match SupabaseClient::send(request).await {
            Ok(_) => {}
            // The server already forgot this session.
            Err(e) if matches!(e.status, Some(401 | 403 | 404)) => {
                debug!(status = ?e.status, "logout for an expired session");
            }
            Err(e) => return Err(e),
        }
        self.publish(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), BackendError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/recover", None)
            .query(&[("redirect_to", redirect_to)])
            .json(&serde_json::json!({ "email": email }));
        SupabaseClient::send(request).await?;
        Ok(())
    }

    async fn update_credential(&self, new_password: &str) -> Result<(), BackendError> {
        let token = self.access_token().ok_or_else(|| BackendError::new(SESSION_MISSING))?;
        let request = self
            .client
            .request(Method::PUT, "/auth/v1/user", Some(&token))
            .json(&serde_json::json!({ "password": new_password }));
        let body = SupabaseClient::send(request).await?;
        match serde_json::from_str::<AuthUser>(&body) {
            Ok(user) => {
                self.session.send_if_modified(|held| match held {
                    Some(session) if session.user.id == user.id => {
                        session.user = user;
                        true
                    }
                    _ => false,
                });
            }
            Err(e) => warn!(error = %e, "unparseable user in password update response"),
        }
        Ok(())
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse a sign-in or sign-up body.
///
/// Shapes accepted: a session object (has `access_token`), a bare user
/// object (sign-up awaiting confirmation), or `{ user, session }`.
fn parse_auth_response(body: &str) -> Result<AuthResponse, BackendError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| BackendError::new(format!("auth response parse failed: {e}")))?;
    let parse_err = |e: serde_json::Error| BackendError::new(format!("auth response parse failed: {e}"));

    if value.get("access_token").is_some() {
        let session: Session = serde_json::from_value(value).map_err(parse_err)?;
        return Ok(AuthResponse { user: Some(session.user.clone()), session: Some(session) });
    }

    if let Some(user) = value.get("user").filter(|u| u.is_object()) {
        let user: AuthUser = serde_json::from_value(user.clone()).map_err(parse_err)?;
        let session = match value.get("session") {
            Some(s) if !s.is_null() => Some(serde_json::from_value::<Session>(s.clone()).map_err(parse_err)?),
            _ => None,
        };
        return Ok(AuthResponse { user: Some(user), session });
    }

    let user: AuthUser = serde_json::from_value(value).map_err(parse_err)?;
    Ok(AuthResponse { user: Some(user), session: None })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
