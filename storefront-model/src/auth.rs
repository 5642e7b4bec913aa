//! Login wire types exchanged with the storefront backend.

use crate::role::Role;

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Plain password, sent over TLS only.
    pub password: String,
}

/// Successful login payload: the bearer token and the role it grants.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoginResponse {
    /// Bearer token for later requests.
    pub token: String,
    /// Role the token grants.
    pub role: Role,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Profile of the signed-in account as returned by `GET /api/users/me`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserProfile {
    /// Account email.
    pub email: String,
    /// Display name, when the account has one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
    /// Role of the account.
    pub role: Role,
}
