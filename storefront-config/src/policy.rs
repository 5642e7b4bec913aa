//! Route protection policy
//!
//! Static table of which path prefixes require which role, and where a user
//! of a given role lands after losing their session. Read-only once loaded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use storefront_model::Role;

use crate::error::ConfigError;

/// Role to protected-prefix and role to landing-path tables.
///
/// Fields missing from a config file keep their built-in storefront values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteProtectionPolicy {
    /// Application root; privileged roles are sent here after session loss.
    pub root_path: String,
    /// Login view; customers and sessions with no known role land here.
    pub login_path: String,
    /// Path prefixes that require each role.
    pub protected: BTreeMap<Role, Vec<String>>,
    /// Redirect target per role when the session is lost on a protected page.
    pub landing: BTreeMap<Role, String>,
}

impl Default for RouteProtectionPolicy {
    fn default() -> Self {
        let protected = BTreeMap::from([
            (
                Role::Customer,
                ["/profile", "/orders", "/quotes", "/cart", "/checkout"]
                    .map(String::from)
                    .to_vec(),
            ),
            (
                Role::Seller,
                ["/seller-dashboard", "/seller"].map(String::from).to_vec(),
            ),
            (
                Role::Admin,
                ["/admin-dashboard", "/admin"].map(String::from).to_vec(),
            ),
        ]);
        let root_path = "/".to_string();
        let login_path = "/login".to_string();
        let landing = BTreeMap::from([
            (Role::Admin, root_path.clone()),
            (Role::Seller, root_path.clone()),
            (Role::Customer, login_path.clone()),
        ]);

        Self {
            root_path,
            login_path,
            protected,
            landing,
        }
    }
}

impl RouteProtectionPolicy {
    /// Roles whose protected prefixes cover `path`.
    pub fn roles_protecting(&self, path: &str) -> Vec<Role> {
        let path = strip_query(path);
        self.protected
            .iter()
            .filter(|(_, prefixes)| {
                prefixes.iter().any(|prefix| prefix_matches(path, prefix))
            })
            .map(|(role, _)| *role)
            .collect()
    }

    /// True when `path` is protected for any role.
    pub fn is_protected(&self, path: &str) -> bool {
        let path = strip_query(path);
        self.protected
            .values()
            .flatten()
            .any(|prefix| prefix_matches(path, prefix))
    }

    /// Where a user who held `role` goes after losing the session.
    ///
    /// The landing table wins when it names the role. Otherwise admins and
    /// sellers go to the root and everyone else to the login view.
    pub fn landing_for(&self, role: Option<Role>) -> &str {
        match role {
            Some(role) => match self.landing.get(&role) {
                Some(path) => path.as_str(),
                None if role.is_privileged() => self.root_path.as_str(),
                None => self.login_path.as_str(),
            },
            None => self.login_path.as_str(),
        }
    }

    /// Redirect decision after session loss at `current_path`.
    ///
    /// Returns `None` when the page is public for every role, so the user can
    /// keep browsing without a session.
    pub fn redirect_after_session_loss(
        &self,
        current_path: &str,
        role: Option<Role>,
    ) -> Option<&str> {
        if self.is_protected(current_path) {
            Some(self.landing_for(role))
        } else {
            None
        }
    }

    /// Check that every path is absolute and no role lands on a page
    /// protected for itself.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.root_path, &self.login_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "path '{path}' must start with '/'"
                )));
            }
        }

        for (role, prefixes) in &self.protected {
            if let Some(bad) = prefixes.iter().find(|p| !p.starts_with('/')) {
                return Err(ConfigError::Invalid(format!(
                    "protected prefix '{bad}' for role {role} must start with '/'"
                )));
            }
        }

        for role in Role::ALL {
            let landing = self.landing_for(Some(role));
            if !landing.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "landing path '{landing}' for role {role} must start with '/'"
                )));
            }
            if self.roles_protecting(landing).contains(&role) {
                return Err(ConfigError::Invalid(format!(
                    "landing path '{landing}' for role {role} is protected for that role"
                )));
            }
        }

        Ok(())
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Segment-aware prefix match: `/seller` covers `/seller` and
/// `/seller/items` but not `/sellers`.
fn prefix_matches(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
