//! Route guards for protected views
//!
//! A guard wraps a view: while the session is still loading it renders
//! nothing, without a session it raises the login prompt and sends the user
//! to the root, and with the wrong role it sends them to the root with a
//! permission notice.

use std::sync::Arc;

use storefront_config::RouteProtectionPolicy;
use storefront_model::{Role, Severity};

use crate::domains::auth::state::SessionState;
use crate::domains::ui::feedback::NotificationChannel;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please login to access this page";
pub const PERMISSION_DENIED_MESSAGE: &str =
    "You do not have permission to access this page";

/// Result of guarding a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome<V> {
    /// Access granted; the wrapped view was rendered.
    Render(V),
    /// Access refused; the caller should navigate here instead.
    Redirect(String),
    /// Session state is still loading; render nothing yet.
    Pending,
}

impl<V> GuardOutcome<V> {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardOutcome::Render(_))
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardOutcome::Redirect(path) => Some(path.as_str()),
            _ => None,
        }
    }
}

/// Access decision for a role allow-list, without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Unauthenticated,
    DisallowedRole(Role),
    Allowed(Role),
}

#[derive(Debug)]
pub struct RouteGuard {
    state: Arc<SessionState>,
    notifications: Arc<NotificationChannel>,
    policy: Arc<RouteProtectionPolicy>,
}

impl RouteGuard {
    pub fn new(
        state: Arc<SessionState>,
        notifications: Arc<NotificationChannel>,
        policy: Arc<RouteProtectionPolicy>,
    ) -> Self {
        Self {
            state,
            notifications,
            policy,
        }
    }

    /// Classify the current session against `allowed`. An empty allow-list
    /// admits any authenticated role.
    pub fn evaluate(&self, allowed: &[Role]) -> AccessState {
        match self.state.role() {
            None => AccessState::Unauthenticated,
            Some(role) if allowed.is_empty() || allowed.contains(&role) => {
                AccessState::Allowed(role)
            }
            Some(role) => AccessState::DisallowedRole(role),
        }
    }

    /// Render `render` for any authenticated user.
    pub fn require_auth<V>(&self, render: impl FnOnce() -> V) -> GuardOutcome<V> {
        self.require_role(&[], render)
    }

    /// Render `render` only for a session whose role is in `allowed`.
    pub fn require_role<V>(
        &self,
        allowed: &[Role],
        render: impl FnOnce() -> V,
    ) -> GuardOutcome<V> {
        if self.state.is_initializing() {
            return GuardOutcome::Pending;
        }

        match self.evaluate(allowed) {
            AccessState::Allowed(_) => GuardOutcome::Render(render()),
            AccessState::Unauthenticated => {
                log::debug!("[RouteGuard] No session; prompting for login");
                self.notifications
                    .show(LOGIN_REQUIRED_MESSAGE, Severity::Error);
                // Redirect below replaces the prompt's own redirect.
                self.state.raise_popup();
                GuardOutcome::Redirect(self.policy.root_path.clone())
            }
            AccessState::DisallowedRole(role) => {
                log::debug!(
                    "[RouteGuard] Role {} not in {:?}; redirecting",
                    role,
                    allowed
                );
                self.notifications
                    .show(PERMISSION_DENIED_MESSAGE, Severity::Error);
                GuardOutcome::Redirect(self.policy.root_path.clone())
            }
        }
    }
}
