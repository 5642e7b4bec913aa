//! Shared configuration library for the storefront client.
//!
//! Centralizes the client settings (backend URL, timeouts, session file
//! location) and the [`RouteProtectionPolicy`] that both the session expiry
//! reaction and the login prompt consult. The policy is plain data so the
//! composing application can ship it in a file instead of code.

pub mod error;
pub mod loader;
pub mod policy;

mod duration_serde;

pub use error::ConfigError;
pub use loader::{ClientConfig, ConfigSource};
pub use policy::RouteProtectionPolicy;
