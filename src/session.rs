//! Authentication state as seen by the sync engine.
//!
//! Credential issuance lives elsewhere. The engine only asks for the current
//! credential and listens for the session dropping back to unauthenticated.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Unauthenticated,
    Authenticated { username: String },
}

impl SessionState {
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Authenticated { username } => Some(username),
            _ => None,
        }
    }
}

/// Where the bearer credential is kept between runs
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// Process-local credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|guard| guard.clone())
    }

    fn save(&self, token: &str) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
    }
}

/// Resolves a stored credential to the user it belongs to
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn whoami(&self, token: &str) -> Result<String>;
}

/// Shared handle on the session state machine
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
    state: Arc<watch::Sender<SessionState>>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            store,
            state: Arc::new(state),
        }
    }

    /// Resolves the startup state from the stored credential
    pub async fn bootstrap(&self, verifier: &dyn CredentialVerifier) -> SessionState {
        let Some(token) = self.store.load() else {
            self.transition(SessionState::Unauthenticated);
            return self.state();
        };

        match verifier.whoami(&token).await {
            Ok(username) => self.transition(SessionState::Authenticated { username }),
            Err(err) => {
                debug!(error = %err, "stored credential rejected");
                self.store.clear();
                self.transition(SessionState::Unauthenticated);
            }
        }
        self.state()
    }

    pub fn login_succeeded(&self, username: impl Into<String>, token: &str) {
        self.store.save(token);
        self.transition(SessionState::Authenticated {
            username: username.into(),
        });
    }

    pub fn logout(&self) {
        self.store.clear();
        self.transition(SessionState::Unauthenticated);
    }

    /// Drops the credential after the server rejected it
    pub fn invalidate(&self) {
        if *self.state.borrow() == SessionState::Unauthenticated {
            return;
        }
        info!("credential rejected, session is now unauthenticated");
        self.logout();
    }

    /// Current bearer credential, if any
    pub fn credential(&self) -> Option<String> {
        self.store.load()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn transition(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}
