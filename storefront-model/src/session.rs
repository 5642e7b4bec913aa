//! The authenticated session pair.

use std::fmt;

use crate::error::{ModelError, Result};
use crate::role::Role;

/// The authenticated identity: an opaque bearer token paired with a role.
///
/// The pair is never mutated in place. A new login replaces the whole value
/// and logout or expiry drops it, so holders never observe a token without
/// its role.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Session {
    token: String,
    role: Role,
}

impl Session {
    /// Pair `token` with `role`. A blank token is rejected.
    pub fn new(token: impl Into<String>, role: Role) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ModelError::EmptyToken);
        }
        Ok(Self { token, role })
    }

    /// Opaque bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Role the token was issued for.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}
