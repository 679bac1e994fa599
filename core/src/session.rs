//! Session (auth) state.
//!
//! # Design
//! A `Session` is three fields: whether the user is logged in, whether the
//! login UI should be shown, and the bearer token. `SessionManager` guards it
//! with a `RwLock`: mutations are serialized through the write lock and reads
//! proceed concurrently. `SessionManager::global()` is the process-scoped
//! instance; it is created on first use and lives until the process exits.
//! Nothing is persisted.

use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    AwaitingLogin,
    LoggedIn,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub is_logged_in: bool,
    pub show_login: bool,
    pub token: Option<String>,
}

impl Session {
    pub fn state(&self) -> AuthState {
        if self.is_logged_in {
            AuthState::LoggedIn
        } else if self.show_login {
            AuthState::AwaitingLogin
        } else {
            AuthState::LoggedOut
        }
    }

    /// Ask for the login UI unless already logged in. Returns whether the
    /// flag flipped.
    pub fn require_login(&mut self) -> bool {
        if self.is_logged_in || self.show_login {
            return false;
        }
        self.show_login = true;
        true
    }

    pub fn record_login(&mut self, token: impl Into<String>) {
        self.is_logged_in = true;
        self.show_login = false;
        self.token = Some(token.into());
    }

    pub fn logout(&mut self) {
        self.is_logged_in = false;
        self.show_login = false;
        self.token = None;
    }
}

#[derive(Debug, Default)]
pub struct SessionManager {
    session: RwLock<Session>,
}

static GLOBAL: OnceLock<Arc<SessionManager>> = OnceLock::new();

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide session.
    pub fn global() -> Arc<SessionManager> {
        GLOBAL.get_or_init(|| Arc::new(SessionManager::new())).clone()
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn state(&self) -> AuthState {
        self.read().state()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn require_login(&self) -> bool {
        let flipped = self.write().require_login();
        if flipped {
            tracing::info!(target: "appkit::session", "login required");
        }
        flipped
    }

    pub fn record_login(&self, token: impl Into<String>) {
        self.write().record_login(token);
        tracing::info!(target: "appkit::session", "logged in");
    }

    pub fn logout(&self) {
        self.write().logout();
        tracing::info!(target: "appkit::session", "logged out");
    }

    // A panic while holding the lock cannot leave the three fields torn, so
    // poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}
