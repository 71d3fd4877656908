//! PostgREST access to the `perfil_usuario` table.

use reqwest::Method;
use tokio::sync::watch;
use uuid::Uuid;

use super::SupabaseClient;
use crate::backend::ProfileStore;
use crate::error::BackendError;
use crate::types::{NewProfile, Profile, ProfileUpdate, Session};

const PROFILE_TABLE: &str = "/rest/v1/perfil_usuario";

pub struct SupabaseProfiles {
    client: SupabaseClient,
    /// Session held by the auth client; its token scopes row-level security.
    session: watch::Receiver<Option<Session>>,
}

impl SupabaseProfiles {
    #[must_use]
    pub fn new(client: SupabaseClient, session: watch::Receiver<Option<Session>>) -> Self {
        Self { client, session }
    }

    fn request(&self, method: Method) -> reqwest::RequestBuilder {
        let token = self.session.borrow().as_ref().map(|s| s.access_token.clone());
        self.client.request(method, PROFILE_TABLE, token.as_deref())
    }
}

#[async_trait::async_trait]
impl ProfileStore for SupabaseProfiles {
    async fn get_profile_for(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError> {
        let request = self
            .request(Method::GET)
            .query(&[("id_usuario", format!("eq.{user_id}")), ("select", "*".to_owned())]);
        let body = SupabaseClient::send(request).await?;
        at_most_one(parse_rows(&body)?)
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, BackendError> {
        let request = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(&[profile]);
        let body = SupabaseClient::send(request).await?;
        exactly_one(parse_rows(&body)?)
    }

    async fn update_profile(&self, profile_id: Uuid, update: &ProfileUpdate) -> Result<Profile, BackendError> {
        let request = self
            .request(Method::PATCH)
            .query(&[("id", format!("eq.{profile_id}"))])
            .header("Prefer", "return=representation")
            .json(update);
        let body = SupabaseClient::send(request).await?;
        exactly_one(parse_rows(&body)?)
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_rows(body: &str) -> Result<Vec<Profile>, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::new(format!("profile parse failed: {e}")))
}

/// Zero rows is "not onboarded"; more than one is a data error.
fn at_most_one(mut rows: Vec<Profile>) -> Result<Option<Profile>, BackendError> {
    match rows.len() {
        0 | 1 => Ok(rows.pop()),
        n => Err(BackendError::new(format!("expected at most one profile, found {n}"))),
    }
}

fn exactly_one(rows: Vec<Profile>) -> Result<Profile, BackendError> {
    at_most_one(rows)?.ok_or_else(|| BackendError::new("profile write returned no row"))
}

#[cfg(test)]
#[path = "profiles_test.rs"]
mod tests;
