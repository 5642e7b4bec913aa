//! Authentication domain
//!
//! Durable session storage, the in-memory session state, route guards and
//! the reaction to a rejected credential.

pub mod errors;
pub mod expiry;
pub mod guard;
pub mod service;
pub mod state;
pub mod storage;

pub use errors::{AuthError, AuthResult, StorageError};
pub use expiry::{ExpiryOutcome, SESSION_EXPIRED_MESSAGE, SessionExpiryProtocol};
pub use guard::{AccessState, GuardOutcome, RouteGuard};
pub use service::{ApiAuthService, AuthService};
pub use state::{ListenerId, SessionState};
pub use storage::{FileSessionStore, MemorySessionStore, SessionStore};
