//! Bridge wire messages — newline-delimited JSON.

use serde::{Deserialize, Serialize};

use crate::context::ContextResult;

/// Cursor movement direction for `move_cursor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// Messages from the remote device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for the context around the caret.
    RequestContext {
        #[serde(default)]
        force: bool,
    },
    /// Type text into the focused application. `mode` is the client's
    /// input mode, echoed back in injection errors.
    TextInput {
        text: String,
        #[serde(default = "default_input_mode")]
        mode: String,
    },
    /// A special key, e.g. `"backspace"`.
    KeyCommand { key: String },
    /// Move the caret `steps` characters.
    MoveCursor { direction: Direction, steps: u32 },
}

fn default_input_mode() -> String {
    "stream".to_string()
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Connected,
    /// Another device took over; this session is closed.
    Replaced,
}

/// Messages to the remote device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerMessage {
    StatusUpdate {
        status: SessionStatus,
        session: String,
        /// Name of the machine being typed into.
        hostname: String,
    },
    ContextUpdate(ContextResult),
    Error {
        message: String,
        code: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code: code.into(),
            detail: None,
            mode: None,
        }
    }

    /// `INJECT_ERR` carrying the underlying failure and, for text input,
    /// the client's input mode.
    pub fn inject_error(detail: impl Into<String>, mode: Option<String>) -> Self {
        Self::Error {
            message: "Injection failed".to_string(),
            code: "INJECT_ERR".to_string(),
            detail: Some(detail.into()),
            mode,
        }
    }
}
