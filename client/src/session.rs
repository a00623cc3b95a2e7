//! Identity/session state machine.
//!
//! `Disconnected -> Connected` only through a successful explicit connect
//! request. `Connected -> Disconnected` when the account is cleared or the
//! network changes; a network change is terminal for the session and the
//! embedder is expected to bootstrap a fresh client.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Connected,
}

pub struct SessionMonitor {
    state: Mutex<SessionState>,
}

impl SessionMonitor {
    pub fn new() -> Self {
        SessionMonitor {
            state: Mutex::new(SessionState::Disconnected),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Record a successful explicit connect.
    pub fn mark_connected(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != SessionState::Connected {
            info!("session connected");
        }
        *state = SessionState::Connected;
    }

    /// Record a teardown (account cleared or network changed).
    pub fn mark_disconnected(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != SessionState::Disconnected {
            info!("session disconnected");
        }
        *state = SessionState::Disconnected;
    }
}

impl Default for SessionMonitor {
    fn default() -> Self {
        SessionMonitor::new()
    }
}
