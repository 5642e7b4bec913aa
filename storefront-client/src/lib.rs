//! Storefront client library
//!
//! Session and authentication core of the storefront web client: durable
//! session storage, the authenticated HTTP client, the session-expiry
//! protocol, route guards and the notification slot. The `storefront`
//! binary in `src/main.rs` is a thin CLI over [`app::SessionApp`].
//!
//! Notes
//! - Nothing here is a global; [`app::SessionApp::mount`] builds and wires
//!   every component once.
//! - Public items are subject to change before 1.0.

pub mod app;
pub mod domains;
pub mod infra;

pub use app::{MountError, SessionApp};
