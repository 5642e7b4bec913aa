//! Application-wide session state
//!
//! In-memory mirror of the durable [`SessionStore`] plus the transient UI
//! flags the rest of the app renders from. Built once at the composition
//! root and handed out as `Arc<SessionState>`; there is no global instance.

use std::fmt;
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use storefront_config::RouteProtectionPolicy;
use storefront_model::{Role, Session};

use crate::domains::auth::errors::StorageError;
use crate::domains::auth::storage::SessionStore;
use crate::domains::ui::navigation::Navigator;

/// Handle returned by [`SessionState::on_session_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type SessionListener = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

pub struct SessionState {
    store: Arc<dyn SessionStore>,
    policy: Arc<RouteProtectionPolicy>,
    navigator: Arc<dyn Navigator>,
    current: RwLock<Option<Session>>,
    initializing: AtomicBool,
    init: Once,
    popup_visible: AtomicBool,
    listeners: Mutex<Vec<(ListenerId, SessionListener)>>,
    next_listener: AtomicU64,
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("current", &*self.current.read())
            .field("initializing", &self.is_initializing())
            .field("popup_visible", &self.is_popup_visible())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl SessionState {
    /// Create an uninitialized state. Call [`initialize`](Self::initialize)
    /// once at startup, or use [`mount`](Self::mount).
    pub fn new(
        store: Arc<dyn SessionStore>,
        policy: Arc<RouteProtectionPolicy>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            policy,
            navigator,
            current: RwLock::new(None),
            initializing: AtomicBool::new(true),
            init: Once::new(),
            popup_visible: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Create and initialize in one step.
    pub fn mount(
        store: Arc<dyn SessionStore>,
        policy: Arc<RouteProtectionPolicy>,
        navigator: Arc<dyn Navigator>,
    ) -> Arc<Self> {
        let state = Arc::new(Self::new(store, policy, navigator));
        state.initialize();
        state
    }

    /// Read the durable store once. Later calls do nothing.
    pub fn initialize(&self) {
        self.init.call_once(|| {
            let session = self.store.read();
            log::info!(
                "[SessionState] Initialized ({})",
                session
                    .as_ref()
                    .map(|s| format!("role {}", s.role()))
                    .unwrap_or_else(|| "no session".into())
            );
            *self.current.write() = session;
            self.initializing.store(false, Ordering::SeqCst);
        });
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.current.read().as_ref().map(Session::role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn is_popup_visible(&self) -> bool {
        self.popup_visible.load(Ordering::SeqCst)
    }

    /// Write through to the store, then mirror.
    ///
    /// The mirror only changes once the store accepted the new pair.
    pub fn login(&self, session: Session) -> Result<(), StorageError> {
        self.store.write(&session)?;
        log::info!("[SessionState] Logged in as {}", session.role());
        self.replace(Some(session));
        self.popup_visible.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Drop the session locally; no server call is involved.
    ///
    /// The mirror is cleared even if the store fails to, so the UI reflects
    /// the user's intent; the storage error is still returned.
    pub fn logout(&self) -> Result<(), StorageError> {
        let result = self.store.clear();
        log::info!("[SessionState] Logged out");
        self.replace(None);
        result
    }

    /// Show or hide the login prompt.
    ///
    /// Showing it also applies the session-loss redirect for the current
    /// location, using whatever role is held right now.
    pub fn set_popup_visible(&self, visible: bool) {
        self.popup_visible.store(visible, Ordering::SeqCst);
        if !visible {
            return;
        }

        let current_path = self.navigator.current_path();
        if let Some(destination) = self
            .policy
            .redirect_after_session_loss(&current_path, self.role())
            && destination != current_path
        {
            log::info!(
                "[SessionState] Login prompt on protected {}; redirecting to {}",
                current_path,
                destination
            );
            self.navigator.navigate(destination);
        }
    }

    /// Raise the prompt flag without redirecting. For callers that already
    /// made their own redirect decision.
    pub(crate) fn raise_popup(&self) {
        self.popup_visible.store(true, Ordering::SeqCst);
    }

    /// Drop the in-memory mirror after the store has been cleared elsewhere.
    pub(crate) fn expire(&self) {
        self.replace(None);
    }

    /// Register a callback run after every login, logout and expiry.
    pub fn on_session_change<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push((id, Arc::new(callback)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn replace(&self, session: Option<Session>) {
        *self.current.write() = session.clone();

        // Snapshot so callbacks may register or remove listeners.
        let listeners: Vec<SessionListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(session.as_ref());
        }
    }
}
