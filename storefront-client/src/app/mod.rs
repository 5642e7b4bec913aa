//! Composition root
//!
//! Builds every session component once, wires the expiry protocol into the
//! API client, and hands out the entry points the rendering layer needs.

use std::sync::Arc;

use storefront_config::{ClientConfig, ConfigError, RouteProtectionPolicy};
use storefront_model::{Notification, Role, Session, Severity};
use thiserror::Error;

use crate::domains::auth::{
    ApiAuthService, FileSessionStore, GuardOutcome, ListenerId, RouteGuard,
    SessionExpiryProtocol, SessionState, SessionStore,
};
use crate::domains::ui::{NotificationChannel, Navigator};
use crate::infra::{ApiClient, ClientError};

#[derive(Debug, Error)]
pub enum MountError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] ClientError),
}

/// Every session component, wired together.
///
/// There is no global instance; construct one at startup and pass it (or the
/// pieces it exposes) to whatever needs them.
#[derive(Debug)]
pub struct SessionApp {
    config: ClientConfig,
    store: Arc<dyn SessionStore>,
    policy: Arc<RouteProtectionPolicy>,
    notifications: Arc<NotificationChannel>,
    state: Arc<SessionState>,
    expiry: Arc<SessionExpiryProtocol>,
    guard: RouteGuard,
    client: ApiClient,
    auth: ApiAuthService,
}

impl SessionApp {
    /// Wire the components around `store` and `navigator` and read the
    /// durable session once.
    pub fn mount(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, MountError> {
        config.validate()?;

        let policy = Arc::new(config.policy.clone());
        let notifications =
            Arc::new(NotificationChannel::new(config.notification_timeout));
        let state = SessionState::mount(
            Arc::clone(&store),
            Arc::clone(&policy),
            Arc::clone(&navigator),
        );
        let expiry = Arc::new(SessionExpiryProtocol::new(
            Arc::clone(&store),
            Arc::clone(&state),
            Arc::clone(&notifications),
            Arc::clone(&policy),
            navigator,
        ));

        let notify_channel = Arc::clone(&notifications);
        let client = ApiClient::builder(config.server_url.clone())
            .timeout(config.request_timeout)
            .session_store(Arc::clone(&store))
            .on_session_expired(expiry.as_callback())
            .notify(Arc::new(move |message: &str, severity: Severity| {
                notify_channel.show(message, severity);
            }))
            .build()?;

        let guard = RouteGuard::new(
            Arc::clone(&state),
            Arc::clone(&notifications),
            Arc::clone(&policy),
        );
        let auth = ApiAuthService::new(client.clone(), Arc::clone(&state));

        log::info!(
            "[SessionApp] Mounted against {} (session: {})",
            client.base_url(),
            state
                .role()
                .map(|role| role.to_string())
                .unwrap_or_else(|| "none".into())
        );

        Ok(Self {
            config,
            store,
            policy,
            notifications,
            state,
            expiry,
            guard,
            client,
            auth,
        })
    }

    /// Mount with the file-backed store named by `config`.
    pub fn mount_from_config(
        config: ClientConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, MountError> {
        let store = Arc::new(FileSessionStore::new(config.session_file_path()?));
        Self::mount(config, store, navigator)
    }

    /// Show `message` in the notification slot.
    pub fn notify(&self, message: &str, severity: Severity) -> Notification {
        self.notifications.show(message, severity)
    }

    /// Render `view` only with a session.
    pub fn require_auth<V>(&self, view: impl FnOnce() -> V) -> GuardOutcome<V> {
        self.guard.require_auth(view)
    }

    /// Render `view` only for a session whose role is in `roles`.
    pub fn require_role<V>(
        &self,
        roles: &[Role],
        view: impl FnOnce() -> V,
    ) -> GuardOutcome<V> {
        self.guard.require_role(roles, view)
    }

    pub fn on_session_change<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        self.state.on_session_change(callback)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn policy(&self) -> &RouteProtectionPolicy {
        &self.policy
    }

    pub fn notifications(&self) -> &Arc<NotificationChannel> {
        &self.notifications
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    pub fn expiry(&self) -> &Arc<SessionExpiryProtocol> {
        &self.expiry
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn auth(&self) -> &ApiAuthService {
        &self.auth
    }
}
