//! Text injection into the focused application.
//!
//! Text is pasted through the clipboard inside a `ClipboardGuard`, so an
//! injection and a context grab never interleave their clipboard use and
//! the user's clipboard survives both.

use std::sync::Arc;
use std::thread;

use crate::config::Timings;
use crate::context::guard::{input_lock, with_clipboard};
use crate::platform::{ClipboardProvider, InputSynthesizer, Key, PASTE, PlatformError};

/// Injection failure.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// How a piece of text was injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectMode {
    /// Empty text, nothing sent.
    Noop,
    Clipboard,
}

pub struct TextInjector {
    clipboard: Arc<dyn ClipboardProvider>,
    input: Arc<dyn InputSynthesizer>,
    timings: Timings,
}

impl TextInjector {
    pub fn new(
        clipboard: Arc<dyn ClipboardProvider>,
        input: Arc<dyn InputSynthesizer>,
        timings: Timings,
    ) -> Self {
        Self {
            clipboard,
            input,
            timings,
        }
    }

    /// Paste `text` into the focused application. Blocks for the paste
    /// settle delays.
    pub fn inject(&self, text: &str) -> Result<InjectMode, InjectError> {
        if text.is_empty() {
            return Ok(InjectMode::Noop);
        }

        with_clipboard(&*self.clipboard, |guard| {
            guard.clipboard().write(text)?;
            thread::sleep(self.timings.paste_settle);
            self.input.send_combo(&PASTE)?;
            // Give the target time to read the clipboard before restore.
            thread::sleep(self.timings.paste_restore_settle);
            Ok(InjectMode::Clipboard)
        })
    }

    /// Press `key` `repeat` times.
    pub fn press(&self, key: Key, repeat: u32) -> Result<(), InjectError> {
        let _lock = input_lock();
        self.input.send_key(key, repeat)?;
        Ok(())
    }
}
