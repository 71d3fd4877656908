//! Error taxonomy for session coordination.
//!
//! DESIGN
//! ======
//! Collaborators fail with [`BackendError`], which carries the backend's
//! human-readable message. The coordinator maps those into the concern that
//! failed: [`SessionError`] for the startup fetch, [`AuthError`] for account
//! actions, [`LookupError`] for profile fetches. Only `AuthError` rewrites
//! messages; everything else passes the backend text through.

/// Stable machine-readable code for an error, mirrored in logs and CLI output.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// Failure reported by the auth service or the profile store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
    /// HTTP status when the failure came from a response, `None` for transport errors.
    pub status: Option<u16>,
}

impl BackendError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), status: None }
    }

    #[must_use]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self { message: message.into(), status: Some(status) }
    }
}

impl ErrorCode for BackendError {
    fn error_code(&self) -> &'static str {
        "E_BACKEND"
    }

    fn retryable(&self) -> bool {
        matches!(self.status, None | Some(429 | 500..=599))
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// The initial session fetch failed. Fatal to startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SessionError(pub String);

impl From<BackendError> for SessionError {
    fn from(e: BackendError) -> Self {
        Self(e.message)
    }
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        "E_SESSION"
    }
}

// =============================================================================
// AUTH
// =============================================================================

const ALREADY_REGISTERED_MARKER: &str = "User already registered";
const INVALID_CREDENTIALS_MARKER: &str = "Invalid login credentials";

/// An account or credential action failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("This email is already registered. Please log in instead.")]
    AlreadyRegistered,

    #[error("Invalid email or password. Please try again.")]
    InvalidCredentials,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AuthError {
    /// Classify a sign-up failure. Duplicate registrations get a friendly message.
    #[must_use]
    pub fn from_sign_up(e: BackendError) -> Self {
        if e.message.contains(ALREADY_REGISTERED_MARKER) {
            Self::AlreadyRegistered
        } else {
            Self::Backend(e)
        }
    }

    /// Classify a sign-in failure. Bad credentials get a friendly message.
    #[must_use]
    pub fn from_sign_in(e: BackendError) -> Self {
        if e.message.contains(INVALID_CREDENTIALS_MARKER) {
            Self::InvalidCredentials
        } else {
            Self::Backend(e)
        }
    }
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered => "E_ALREADY_REGISTERED",
            Self::InvalidCredentials => "E_INVALID_CREDENTIALS",
            Self::Backend(_) => "E_AUTH_BACKEND",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Backend(e) => e.retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// LOOKUP
// =============================================================================

/// Profile fetch failed. Non-fatal: the user stays signed in without a profile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct LookupError(pub String);

impl From<BackendError> for LookupError {
    fn from(e: BackendError) -> Self {
        Self(e.message)
    }
}

impl ErrorCode for LookupError {
    fn error_code(&self) -> &'static str {
        "E_PROFILE_LOOKUP"
    }
}

// =============================================================================
// PROFILE COMPLETION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("Please fill in all required fields")]
    MissingField(&'static str),

    #[error("no signed-in user")]
    NotSignedIn,

    #[error("profile already completed")]
    AlreadyOnboarded,

    #[error(transparent)]
    Store(#[from] BackendError),
}

impl ErrorCode for ProfileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "E_PROFILE_FIELD",
            Self::NotSignedIn => "E_NOT_SIGNED_IN",
            Self::AlreadyOnboarded => "E_ALREADY_ONBOARDED",
            Self::Store(_) => "E_PROFILE_STORE",
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
