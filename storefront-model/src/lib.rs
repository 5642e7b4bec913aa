//! Core data model definitions shared across storefront crates.
//!
//! These are the values that cross crate boundaries: the authenticated
//! [`Session`] pair, the [`Role`] enum it carries, and the transient
//! [`Notification`] shown to the user.

pub mod auth;
pub mod error;
pub mod notification;
pub mod role;
pub mod session;

pub use auth::{LoginRequest, LoginResponse, UserProfile};
pub use error::{ModelError, Result as ModelResult};
pub use notification::{Notification, Severity};
pub use role::Role;
pub use session::Session;
