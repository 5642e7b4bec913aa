//! UI-facing collaborators of the session core: the notification slot and
//! the navigation seam.

pub mod feedback;
pub mod navigation;

pub use feedback::{ErrorCategory, NotificationChannel, classify_error};
pub use navigation::{HistoryNavigator, Navigator};
