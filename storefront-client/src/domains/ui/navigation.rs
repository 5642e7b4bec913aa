//! Navigation seam between the session core and the rendering layer.

use parking_lot::Mutex;

/// Where the user currently is and how to send them elsewhere.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Path of the current location, e.g. `/seller-dashboard`.
    fn current_path(&self) -> String;

    /// Replace the current location with `path`.
    fn navigate(&self, path: &str);
}

/// In-memory navigator that records every visited path.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HistoryNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![initial.into()]),
        }
    }

    /// Paths in visit order; the last entry is the current location.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.history.lock().last().cloned().unwrap_or_else(|| "/".into())
    }

    fn navigate(&self, path: &str) {
        log::debug!("[Navigator] -> {}", path);
        self.history.lock().push(path.to_string());
    }
}
