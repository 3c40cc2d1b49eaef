//! Session registry — which remote device is currently attached.
//!
//! Only one session is active at a time. A new connection replaces the
//! previous one, which is told so and dropped. Results addressed to a
//! session that is gone are discarded.

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use super::protocol::{ServerMessage, SessionStatus};

pub type SessionId = Uuid;

struct Session {
    id: SessionId,
    outbox: UnboundedSender<ServerMessage>,
}

/// This machine's host name, `"unknown"` when it cannot be read.
pub fn host_name() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            tracing::warn!(error = %e, "cannot read host name");
            "unknown".to_string()
        }
    }
}

/// Owns the active session.
pub struct SessionRegistry {
    hostname: String,
    active: Option<Session>,
}

impl SessionRegistry {
    /// A registry announcing sessions as attached to `hostname`.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            active: None,
        }
    }

    /// Register a new session, replacing any active one.
    pub fn connect(&mut self, outbox: UnboundedSender<ServerMessage>) -> SessionId {
        let id = Uuid::new_v4();

        if let Some(old) = self.active.take() {
            tracing::info!(old = %old.id, new = %id, "replacing active session");
            let _ = old.outbox.send(ServerMessage::StatusUpdate {
                status: SessionStatus::Replaced,
                session: old.id.to_string(),
                hostname: self.hostname.clone(),
            });
        }

        let _ = outbox.send(ServerMessage::StatusUpdate {
            status: SessionStatus::Connected,
            session: id.to_string(),
            hostname: self.hostname.clone(),
        });
        self.active = Some(Session { id, outbox });
        tracing::info!(session = %id, "session connected");
        id
    }

    /// Forget `id` if it is the active session.
    pub fn disconnect(&mut self, id: SessionId) {
        if self.active.as_ref().is_some_and(|s| s.id == id) {
            self.active = None;
            tracing::info!(session = %id, "session disconnected");
        }
    }

    #[cfg(test)]
    pub fn active(&self) -> Option<SessionId> {
        self.active.as_ref().map(|s| s.id)
    }

    /// Send `message` to `id`. Returns `false` if that session is no
    /// longer active or its receiver is gone.
    pub fn deliver(&self, id: SessionId, message: ServerMessage) -> bool {
        match &self.active {
            Some(session) if session.id == id => session.outbox.send(message).is_ok(),
            _ => {
                tracing::debug!(session = %id, "dropping message for inactive session");
                false
            }
        }
    }
}
