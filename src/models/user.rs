use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// A person with access to the system.
///
/// Users are identified by `username`, which is unique across the user set.
/// The password is only ever held as an Argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    #[serde(default)]
    password_hash: Option<String>,
    pub role: Role,
}

/// Authorization level of a [`User`].
///
/// Serialized as its ordinal: `Admin = 0`, `ProjectManager = 1`,
/// `Developer = 2`, `Viewer = 3`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "i64", try_from = "i64")]
pub enum Role {
    Admin,
    ProjectManager,
    Developer,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::ProjectManager => "project_manager",
            Self::Developer => "developer",
            Self::Viewer => "viewer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "project_manager" => Some(Self::ProjectManager),
            "developer" => Some(Self::Developer),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => 0,
            Role::ProjectManager => 1,
            Role::Developer => 2,
            Role::Viewer => 3,
        }
    }
}

impl TryFrom<i64> for Role {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::Admin),
            1 => Ok(Self::ProjectManager),
            2 => Ok(Self::Developer),
            3 => Ok(Self::Viewer),
            _ => Err(Error::InvalidOrdinal {
                kind: "role",
                value,
            }),
        }
    }
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: None,
            role,
        }
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// Store an already computed hash verbatim.
    pub fn set_password_hash(&mut self, hash: impl Into<String>) {
        self.password_hash = Some(hash.into());
    }

    /// Hash `password` with Argon2id and a fresh random salt.
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| Error::PasswordHash(e.to_string()))?;

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::PasswordHash(e.to_string()))?;

        self.password_hash = Some(hash.to_string());
        Ok(())
    }

    /// Returns true iff `candidate` verifies against the stored hash.
    ///
    /// A user without a hash, or with a hash that is not a PHC string,
    /// never verifies.
    pub fn verify_password(&self, candidate: &str) -> bool {
        let Some(stored) = self.password_hash.as_deref() else {
            return false;
        };

        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(
                    username = %self.username,
                    error = %e,
                    "stored password hash is unparsable"
                );
                false
            }
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "username": self.username,
            "email": self.email,
            "password_hash": self.password_hash,
            "role": self.role,
        })
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        super::decode(value, "user")
    }
}
