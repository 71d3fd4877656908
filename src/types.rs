//! Domain types shared by the coordinator, the collaborators and the guard.
//!
//! Wire names follow the hosted `perfil_usuario` table, so profile rows
//! deserialize straight from the data service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProfileError;

// =============================================================================
// AUTH
// =============================================================================

/// The authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// A live backend session for [`AuthUser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

/// Raw payload returned by sign-in and sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthResponse {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    /// True when the backend returned no active session: the address must be confirmed first.
    pub needs_email_verification: bool,
    pub response: AuthResponse,
}

// =============================================================================
// PROFILE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "estudiante")]
    Student,
    #[serde(rename = "profesor")]
    Teacher,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "estudiante",
            Self::Teacher => "profesor",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Teacher => "Teacher",
        }
    }

    /// Landing route for this role.
    #[must_use]
    pub fn dashboard_path(self) -> &'static str {
        match self {
            Self::Student => "/student-dashboard",
            Self::Teacher => "/teacher-dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" | "estudiante" => Ok(Self::Student),
            "teacher" | "profesor" => Ok(Self::Teacher),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Application-level profile for an [`AuthUser`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(rename = "id_usuario")]
    pub user_id: Uuid,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "correo", default)]
    pub email: Option<String>,
    #[serde(rename = "url_avatar", default)]
    pub avatar_url: Option<String>,
    #[serde(rename = "fecha_creacion", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "fecha_actualizacion", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Profile {
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Insert payload for profile completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    #[serde(rename = "id_usuario")]
    pub user_id: Uuid,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "correo")]
    pub email: Option<String>,
    #[serde(rename = "url_avatar")]
    pub avatar_url: Option<String>,
}

impl NewProfile {
    /// Trim the name fields and reject blanks. Empty avatar URLs become `None`.
    pub fn validate(mut self) -> Result<Self, ProfileError> {
        self.first_name = self.first_name.trim().to_owned();
        self.last_name = self.last_name.trim().to_owned();
        if self.first_name.is_empty() {
            return Err(ProfileError::MissingField("first_name"));
        }
        if self.last_name.is_empty() {
            return Err(ProfileError::MissingField("last_name"));
        }
        self.avatar_url = self.avatar_url.filter(|url| !url.trim().is_empty());
        Ok(self)
    }
}

/// Patch payload for an existing profile. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "apellido", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "correo", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "url_avatar", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

// =============================================================================
// COORDINATOR STATE
// =============================================================================

/// Snapshot of the coordinator's view of the signed-in principal.
///
/// `profile` is always `None` when `user` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorState {
    pub user: Option<AuthUser>,
    pub profile: Option<Profile>,
    pub loading: bool,
    pub error: Option<String>,
}

impl CoordinatorState {
    #[must_use]
    pub fn initializing() -> Self {
        Self { loading: true, ..Self::default() }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
