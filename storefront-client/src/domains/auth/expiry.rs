//! Reaction to a rejected bearer credential
//!
//! Runs when the API client sees a 401. The redirect depends on the role the
//! user held, so the role is read from the store before anything is cleared.

use std::sync::Arc;

use storefront_config::RouteProtectionPolicy;
use storefront_model::{Role, Severity};

use crate::domains::auth::state::SessionState;
use crate::domains::auth::storage::SessionStore;
use crate::domains::ui::feedback::NotificationChannel;
use crate::domains::ui::navigation::Navigator;
use crate::infra::middleware::SessionExpiredCallback;

pub const SESSION_EXPIRED_MESSAGE: &str =
    "Your session has expired. Please log in again.";

/// What one run of the protocol decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryOutcome {
    /// Role held before the store was cleared, if any.
    pub previous_role: Option<Role>,
    /// Where the user was sent; `None` when the page is public.
    pub redirect: Option<String>,
}

pub struct SessionExpiryProtocol {
    store: Arc<dyn SessionStore>,
    state: Arc<SessionState>,
    notifications: Arc<NotificationChannel>,
    policy: Arc<RouteProtectionPolicy>,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for SessionExpiryProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionExpiryProtocol")
            .field("store", &self.store)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionExpiryProtocol {
    pub fn new(
        store: Arc<dyn SessionStore>,
        state: Arc<SessionState>,
        notifications: Arc<NotificationChannel>,
        policy: Arc<RouteProtectionPolicy>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            state,
            notifications,
            policy,
            navigator,
        }
    }

    /// Clear the session, tell the user, prompt for login and redirect off
    /// protected pages.
    ///
    /// Safe to run repeatedly: a second run finds an empty store, clears
    /// nothing and at worst replaces the notification with the same text.
    pub fn run(&self) -> ExpiryOutcome {
        let previous_role = self.store.read().map(|session| session.role());

        if let Err(err) = self.store.clear() {
            log::warn!("[SessionExpiry] Failed to clear stored session: {}", err);
        }
        self.state.expire();

        self.notifications
            .show(SESSION_EXPIRED_MESSAGE, Severity::Error);
        self.state.raise_popup();

        let current_path = self.navigator.current_path();
        let redirect = self
            .policy
            .redirect_after_session_loss(&current_path, previous_role)
            .map(str::to_string);

        match &redirect {
            Some(destination) => {
                log::info!(
                    "[SessionExpiry] Session for {:?} expired on {}; redirecting to {}",
                    previous_role,
                    current_path,
                    destination
                );
                self.navigator.navigate(destination);
            }
            None => log::info!(
                "[SessionExpiry] Session for {:?} expired on public page {}",
                previous_role,
                current_path
            ),
        }

        ExpiryOutcome {
            previous_role,
            redirect,
        }
    }

    /// Callback form for wiring into the API client.
    pub fn as_callback(self: &Arc<Self>) -> SessionExpiredCallback {
        let protocol = Arc::clone(self);
        Arc::new(move || {
            protocol.run();
        })
    }
}
