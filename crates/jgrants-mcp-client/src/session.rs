// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle: `Uninitialized -> Initializing -> Ready`.

/// Where the client stands with the intermediary server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No handshake yet, or the last session was invalidated.
    #[default]
    Uninitialized,
    /// A handshake is in flight (or was abandoned mid-flight).
    Initializing,
    /// Handshake done. Servers may legitimately issue no session id.
    Ready { session_id: Option<String> },
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready { .. })
    }

    /// Session id to send, if the session is ready and has one.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            SessionState::Ready { session_id } => session_id.as_deref(),
            _ => None,
        }
    }
}

/// True when an error message points at an invalid or expired session.
pub fn mentions_session(message: &str) -> bool {
    message.to_ascii_lowercase().contains("session")
}
