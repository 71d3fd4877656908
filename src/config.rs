//! Hosted backend configuration parsed from environment variables.

pub const DEFAULT_SITE_URL: &str = "http://localhost:5173";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(&'static str),
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project base URL without trailing slash, e.g. `https://abc.supabase.co`.
    pub url: String,
    pub anon_key: String,
    /// Public origin of the web app; email links redirect here.
    pub site_url: String,
    pub timeouts: Timeouts,
}

impl SupabaseConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `SITE_URL`: default `http://localhost:5173`
    /// - `SUPABASE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SUPABASE_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a required variable is missing or a URL is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("SUPABASE_URL").map_err(|_| ConfigError::MissingVar("SUPABASE_URL"))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY").map_err(|_| ConfigError::MissingVar("SUPABASE_ANON_KEY"))?;
        let site_url = std::env::var("SITE_URL").unwrap_or_else(|_| DEFAULT_SITE_URL.to_owned());
        let timeouts = Timeouts {
            request_secs: env_parse("SUPABASE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("SUPABASE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Self::new(url, anon_key, site_url, timeouts)
    }

    /// Build config from explicit values, normalizing URLs.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either URL lacks an `http(s)://` scheme or the key is blank.
    pub fn new(url: String, anon_key: String, site_url: String, timeouts: Timeouts) -> Result<Self, ConfigError> {
        let url = normalize_url("SUPABASE_URL", &url)?;
        let site_url = normalize_url("SITE_URL", &site_url)?;
        if anon_key.trim().is_empty() {
            return Err(ConfigError::MissingVar("SUPABASE_ANON_KEY"));
        }
        Ok(Self { url, anon_key, site_url, timeouts })
    }

    #[must_use]
    pub fn redirects(&self) -> Redirects {
        Redirects::for_site(&self.site_url)
    }
}

/// Email link targets handed to the auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirects {
    /// Where the sign-up confirmation link lands.
    pub email_confirmation: String,
    /// Where the password-reset link lands.
    pub password_reset: String,
}

impl Redirects {
    #[must_use]
    pub fn for_site(site_url: &str) -> Self {
        let base = site_url.trim_end_matches('/');
        Self { email_confirmation: format!("{base}/login"), password_reset: format!("{base}/reset-password") }
    }
}

fn normalize_url(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::Invalid { var, reason: format!("expected http(s) URL, got '{raw}'") });
    }
    Ok(trimmed.to_owned())
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
