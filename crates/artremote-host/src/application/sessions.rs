//! Session registry and authentication state machine.
//!
//! Every accepted connection becomes a session that moves through
//! `Connecting → AwaitingAuth → Authenticated → Closed` (the `AwaitingAuth`
//! stage is skipped when authentication is disabled).  Commands are only
//! routed for authenticated sessions; the transport layer enforces the
//! handshake ordering and timeout, this module owns the state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::infrastructure::credentials::CredentialStore;

/// Lifecycle state of one remote-device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted, handshake not yet started.
    Connecting,
    /// `auth_required` sent; waiting for credentials.
    AwaitingAuth,
    /// Credentials accepted (or auth disabled); commands are routed.
    Authenticated,
    /// Terminal.
    Closed,
}

/// Why an authentication attempt was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("invalid authentication credentials")]
    InvalidCredentials,
    #[error("unknown session")]
    UnknownSession,
}

struct Session {
    state: SessionState,
    client_info: Option<Value>,
    connected_at: Instant,
    last_activity: Instant,
}

/// Registry of live sessions plus the credential check.
pub struct SessionManager {
    credentials: Option<Arc<CredentialStore>>,
    auth_timeout: Duration,
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionManager {
    /// `credentials: None` disables authentication: sessions are trusted on
    /// connect (pass `--no-auth`, LAN-only setups).
    pub fn new(credentials: Option<Arc<CredentialStore>>, auth_timeout: Duration) -> Self {
        Self {
            credentials,
            auth_timeout,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn auth_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// How long a session may sit in `AwaitingAuth`.
    pub fn auth_timeout(&self) -> Duration {
        self.auth_timeout
    }

    /// Registers a new session in `Connecting`.  The transport moves it on:
    /// [`begin_auth`](Self::begin_auth) once the challenge is sent, or
    /// [`handle_auth`](Self::handle_auth) (trivially accepted) when
    /// authentication is disabled.
    pub fn open_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();
        self.lock().insert(
            id,
            Session {
                state: SessionState::Connecting,
                client_info: None,
                connected_at: now,
                last_activity: now,
            },
        );
        debug!(session = %id, "session opened");
        id
    }

    /// Marks the session as challenged: `auth_required` has been sent and
    /// the handshake window is running.
    pub fn begin_auth(&self, id: Uuid) {
        if let Some(session) = self.lock().get_mut(&id) {
            session.state = SessionState::AwaitingAuth;
        }
    }

    /// Validates a presented token or PIN and promotes the session.
    ///
    /// On rejection the session is closed; the caller reports the failure
    /// and drops the connection.
    ///
    /// # Errors
    ///
    /// [`AuthFailure::InvalidCredentials`] when neither credential matches,
    /// [`AuthFailure::UnknownSession`] when the id is not registered.
    pub fn handle_auth(
        &self,
        id: Uuid,
        token: Option<&str>,
        pin: Option<&str>,
        client_info: Option<Value>,
    ) -> Result<(), AuthFailure> {
        let accepted = match &self.credentials {
            Some(store) => {
                token.is_some_and(|t| store.validate(t)) || pin.is_some_and(|p| store.validate(p))
            }
            // Auth disabled: any handshake attempt succeeds trivially.
            None => true,
        };

        let mut sessions = self.lock();
        let Some(session) = sessions.get_mut(&id) else {
            return Err(AuthFailure::UnknownSession);
        };

        if !accepted {
            warn!(session = %id, "authentication rejected");
            session.state = SessionState::Closed;
            sessions.remove(&id);
            return Err(AuthFailure::InvalidCredentials);
        }

        session.state = SessionState::Authenticated;
        session.client_info = client_info;
        session.last_activity = Instant::now();
        info!(session = %id, "session authenticated");
        Ok(())
    }

    /// Whether commands from this session may be routed.
    pub fn is_authenticated(&self, id: Uuid) -> bool {
        self.lock()
            .get(&id)
            .is_some_and(|s| s.state == SessionState::Authenticated)
    }

    pub fn state(&self, id: Uuid) -> Option<SessionState> {
        self.lock().get(&id).map(|s| s.state)
    }

    /// Records command activity on the session.
    pub fn touch(&self, id: Uuid) {
        if let Some(session) = self.lock().get_mut(&id) {
            session.last_activity = Instant::now();
        }
    }

    /// Removes the session from the registry.
    pub fn close_session(&self, id: Uuid) {
        if let Some(session) = self.lock().remove(&id) {
            debug!(
                session = %id,
                lifetime_ms = session.connected_at.elapsed().as_millis() as u64,
                "session closed"
            );
        }
    }

    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
