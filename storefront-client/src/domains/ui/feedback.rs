//! Single-slot notification channel
//!
//! One notification is visible at a time. A new `show` replaces whatever is
//! on screen and restarts the auto-clear timer; a timer armed by an older
//! `show` never clears a newer message.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use storefront_model::{Notification, Severity};
use tokio::sync::watch;

pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Broad class of a raw error message, used to pick a friendlier sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Unauthorized,
    NotFound,
    Server,
    Other,
}

impl ErrorCategory {
    /// Canned user-facing sentence, `None` for messages passed through as-is.
    pub fn friendly_message(&self) -> Option<&'static str> {
        match self {
            ErrorCategory::Network => Some(
                "Unable to connect to the server. Please check your internet connection and try again.",
            ),
            ErrorCategory::Unauthorized => {
                Some("Your session has expired. Please log in again.")
            }
            ErrorCategory::NotFound => {
                Some("The requested resource could not be found.")
            }
            ErrorCategory::Server => Some(
                "Something went wrong on our end. Please try again later.",
            ),
            ErrorCategory::Other => None,
        }
    }
}

/// Classify raw error text by keyword.
///
/// Every keyword rule lives here; callers only see the category. Status
/// codes only count as whole words, so "Order 1500" is not a server error.
pub fn classify_error(raw: &str) -> ErrorCategory {
    let lower = raw.to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
    let status = |code: &str| {
        lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| word == code)
    };

    if has(&[
        "network error",
        "failed to fetch",
        "err_network",
        "connection refused",
        "error sending request",
        "timed out",
    ]) {
        ErrorCategory::Network
    } else if status("401") || has(&["unauthorized", "unauthenticated"]) {
        ErrorCategory::Unauthorized
    } else if status("404") || has(&["not found"]) {
        ErrorCategory::NotFound
    } else if status("500") || has(&["internal server error", "server error"]) {
        ErrorCategory::Server
    } else {
        ErrorCategory::Other
    }
}

/// Text that will actually be shown for `message` at `severity`.
pub fn friendly_text(message: &str, severity: Severity) -> String {
    if severity != Severity::Error {
        return message.to_string();
    }
    classify_error(message)
        .friendly_message()
        .map(str::to_string)
        .unwrap_or_else(|| message.to_string())
}

/// Process-wide notification slot with auto-clear.
#[derive(Debug)]
pub struct NotificationChannel {
    slot: Arc<watch::Sender<Option<Notification>>>,
    generation: Arc<AtomicU64>,
    timeout: Duration,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TIMEOUT)
    }
}

impl NotificationChannel {
    pub fn new(timeout: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
            generation: Arc::new(AtomicU64::new(0)),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Replace the visible notification and arm its clear timer.
    ///
    /// Without a tokio runtime the message stays until the next `show` or an
    /// explicit [`clear`](Self::clear).
    pub fn show(
        &self,
        message: impl AsRef<str>,
        severity: Severity,
    ) -> Notification {
        let notification =
            Notification::new(friendly_text(message.as_ref(), severity), severity);

        let mut generation = 0;
        self.slot.send_modify(|slot| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *slot = Some(notification.clone());
        });

        log::debug!(
            "[Notifications] {} notification #{}: {}",
            severity,
            generation,
            notification.message
        );

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let slot = Arc::clone(&self.slot);
                let current = Arc::clone(&self.generation);
                let timeout = self.timeout;
                handle.spawn(async move {
                    tokio::time::sleep(timeout).await;
                    slot.send_if_modified(|value| {
                        if current.load(Ordering::SeqCst) == generation {
                            value.take().is_some()
                        } else {
                            false
                        }
                    });
                });
            }
            Err(_) => log::debug!(
                "[Notifications] No runtime; notification #{} will not auto-clear",
                generation
            ),
        }

        notification
    }

    /// Drop the visible notification and invalidate any pending timer.
    pub fn clear(&self) {
        self.slot.send_if_modified(|slot| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            slot.take().is_some()
        });
    }

    pub fn current(&self) -> Option<Notification> {
        self.slot.borrow().clone()
    }

    /// Observe the slot; the receiver sees every replacement and clear.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.slot.subscribe()
    }
}
