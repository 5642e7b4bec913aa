//! Authentication service trait and implementations
//!
//! The backend is the authority for credentials and token issuance. This
//! side only exchanges credentials for a `{token, role}` pair and hands it
//! to [`SessionState`]; logout never touches the network.

use std::sync::Arc;

use async_trait::async_trait;
use storefront_model::{LoginRequest, LoginResponse, Session, UserProfile};

use crate::domains::auth::errors::{AuthError, AuthResult};
use crate::domains::auth::state::SessionState;
use crate::infra::api_client::ApiClient;
use crate::infra::constants::routes::api;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange credentials for a session and make it current.
    async fn login(&self, email: String, password: String) -> AuthResult<Session>;

    /// Drop the local session.
    async fn logout(&self) -> AuthResult<()>;

    /// Profile of the signed-in account.
    async fn current_user(&self) -> AuthResult<UserProfile>;
}

/// [`AuthService`] backed by the storefront HTTP API.
#[derive(Debug, Clone)]
pub struct ApiAuthService {
    client: ApiClient,
    state: Arc<SessionState>,
}

impl ApiAuthService {
    pub fn new(client: ApiClient, state: Arc<SessionState>) -> Self {
        Self { client, state }
    }
}

#[async_trait]
impl AuthService for ApiAuthService {
    async fn login(&self, email: String, password: String) -> AuthResult<Session> {
        let request = LoginRequest { email, password };
        let response: LoginResponse =
            self.client.post_public(api::auth::LOGIN, &request).await?;

        let session = Session::new(response.token, response.role)?;
        self.state.login(session.clone())?;
        Ok(session)
    }

    async fn logout(&self) -> AuthResult<()> {
        self.state.logout()?;
        Ok(())
    }

    async fn current_user(&self) -> AuthResult<UserProfile> {
        if !self.state.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        Ok(self.client.get(api::users::CURRENT).await?)
    }
}
