//! Hosted backend client: GoTrue auth and PostgREST profile table.
//!
//! DESIGN
//! ======
//! One `SupabaseClient` owns the HTTP client and project credentials.
//! `SupabaseAuth` keeps the live session in a `watch` channel; that channel
//! is both the session-change stream handed to the coordinator and the
//! token source `SupabaseProfiles` uses for row-level security.
//! Response parsing is kept in pure functions for testability.

pub mod auth;
pub mod profiles;

use std::sync::Arc;
use std::time::Duration;

use crate::config::SupabaseConfig;
use crate::error::BackendError;

pub use auth::SupabaseAuth;
pub use profiles::SupabaseProfiles;

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Build the HTTP client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the HTTP client cannot be constructed.
    pub fn new(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::new(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url: config.url.clone(), anon_key: config.anon_key.clone() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Start a request carrying the project key. `bearer` defaults to the anon key.
    fn request(&self, method: reqwest::Method, path: &str, bearer: Option<&str>) -> reqwest::RequestBuilder {
        let token = bearer.unwrap_or(&self.anon_key);
        self.http
            .request(method, self.url(path))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {token}"))
    }

    /// Send and return the body of a 2xx response.
    async fn send(request: reqwest::RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await.map_err(|e| BackendError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| BackendError::new(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(parse_error_body(status, &body));
        }
        Ok(body)
    }
}

/// Build both collaborators over one shared client.
///
/// # Errors
///
/// Returns a [`BackendError`] if the HTTP client cannot be constructed.
pub fn connect(config: &SupabaseConfig) -> Result<(Arc<SupabaseAuth>, Arc<SupabaseProfiles>), BackendError> {
    let client = SupabaseClient::new(config)?;
    let auth = Arc::new(SupabaseAuth::new(client.clone()));
    let profiles = Arc::new(SupabaseProfiles::new(client, auth.session_receiver()));
    Ok((auth, profiles))
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(serde::Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<serde_json::Value>,
}

/// Pull the human-readable message out of an error response.
///
/// GoTrue uses `msg` or `error_description`, PostgREST uses `message`.
fn parse_error_body(status: u16, body: &str) -> BackendError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .or_else(|| parsed.error.and_then(|e| e.as_str().map(str::to_owned)))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() { format!("HTTP {status}") } else { trimmed.to_owned() }
        });
    BackendError::with_status(status, message)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
