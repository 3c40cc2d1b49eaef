//! Request dispatch — runs engine and injector work off the async loop.
//!
//! Acquisitions and injections block (fixed settle delays, synchronous
//! platform calls, a thread-affine accessibility scope), so each runs on
//! a `spawn_blocking` worker. Context results are delivered to the
//! session that asked for them, if it is still attached.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::config::BridgeSettings;
use crate::context::{ContextEngine, ContextRequest};
use crate::platform::{AccessibilityProvider, Key};

use super::inject::{InjectError, TextInjector};
use super::protocol::{ClientMessage, Direction, ServerMessage};
use super::session::{SessionId, SessionRegistry, host_name};

/// Connects sessions to the context engine and the injector.
pub struct Bridge<A> {
    engine: Arc<ContextEngine<A>>,
    injector: Arc<TextInjector>,
    sessions: Arc<Mutex<SessionRegistry>>,
    settings: BridgeSettings,
}

impl<A: AccessibilityProvider + 'static> Bridge<A> {
    pub fn new(engine: ContextEngine<A>, injector: TextInjector, settings: BridgeSettings) -> Self {
        Self {
            engine: Arc::new(engine),
            injector: Arc::new(injector),
            sessions: Arc::new(Mutex::new(SessionRegistry::new(host_name()))),
            settings,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, SessionRegistry> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn connect(&self, outbox: UnboundedSender<ServerMessage>) -> SessionId {
        self.sessions().connect(outbox)
    }

    pub fn disconnect(&self, session: SessionId) {
        self.sessions().disconnect(session);
    }

    pub fn deliver(&self, session: SessionId, message: ServerMessage) -> bool {
        self.sessions().deliver(session, message)
    }

    /// Handle one message from `session`.
    ///
    /// Injections and key presses complete before this returns so input
    /// keeps its order. Context grabs are spawned; their handle is
    /// returned so callers can wait for delivery.
    pub async fn handle(&self, session: SessionId, message: ClientMessage) -> Option<JoinHandle<()>> {
        match message {
            ClientMessage::RequestContext { force } => {
                Some(self.spawn_context_grab(session, force, Duration::ZERO))
            }
            ClientMessage::TextInput { text, mode } => {
                if text.is_empty() {
                    return None;
                }
                let injector = Arc::clone(&self.injector);
                let len = text.chars().count();
                match blocking(move || injector.inject(&text)).await {
                    Ok(mode) => {
                        tracing::info!(%session, ?mode, len, "text injected");
                        Some(self.spawn_context_grab(session, false, self.settings.push_delay))
                    }
                    Err(e) => {
                        tracing::warn!(%session, mode = %mode, error = %e, "injection failed");
                        self.deliver(session, ServerMessage::inject_error(e.to_string(), Some(mode)));
                        None
                    }
                }
            }
            ClientMessage::KeyCommand { key } => {
                match key.as_str() {
                    "backspace" => self.press(session, Key::Backspace, 1).await,
                    other => tracing::warn!(%session, key = other, "unsupported key command"),
                }
                None
            }
            ClientMessage::MoveCursor { direction, steps } => {
                let key = match direction {
                    Direction::Left => Key::Left,
                    Direction::Right => Key::Right,
                };
                if steps > 0 {
                    self.press(session, key, steps).await;
                }
                None
            }
        }
    }

    async fn press(&self, session: SessionId, key: Key, repeat: u32) {
        let injector = Arc::clone(&self.injector);
        match blocking(move || injector.press(key, repeat)).await {
            Ok(()) => tracing::debug!(%session, ?key, repeat, "key pressed"),
            Err(e) => {
                tracing::warn!(%session, ?key, error = %e, "key press failed");
                self.deliver(session, ServerMessage::inject_error(e.to_string(), None));
            }
        }
    }

    /// Acquire context after `delay` and deliver it to `session`.
    fn spawn_context_grab(&self, session: SessionId, force: bool, delay: Duration) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        let sessions = Arc::clone(&self.sessions);
        let request = ContextRequest {
            chars_before: self.settings.chars_before,
            chars_after: self.settings.chars_after,
            force,
        };

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tracing::info!(%session, force, "context grab");

            match tokio::task::spawn_blocking(move || engine.acquire(request)).await {
                Ok(result) => {
                    let delivered = sessions
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .deliver(session, ServerMessage::ContextUpdate(result));
                    if !delivered {
                        tracing::debug!(%session, "context result discarded");
                    }
                }
                Err(e) => tracing::error!(%session, error = %e, "context grab worker failed"),
            }
        })
    }
}

/// Run injector work on a blocking worker.
async fn blocking<T: Send + 'static>(
    work: impl FnOnce() -> Result<T, InjectError> + Send + 'static,
) -> Result<T, InjectError> {
    tokio::task::spawn_blocking(work).await.unwrap_or_else(|e| {
        Err(InjectError::Platform(crate::platform::PlatformError::Input(format!(
            "worker failed: {e}"
        ))))
    })
}
