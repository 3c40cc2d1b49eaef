//! Tier 3 — select-all capture, only on explicit request.
//!
//! Sends select-all and copy, reads the clipboard, then presses Right
//! once to collapse the selection with the caret at the end of the
//! document. Document content is untouched but the target's selection
//! and caret position are not preserved.

use std::thread;

use crate::config::Timings;
use crate::platform::{COPY, ClipboardProvider, InputSynthesizer, Key, SELECT_ALL};

use super::TierFailure;
use super::guard::with_clipboard;
use super::text::{sanitize, tail};

/// Capture the whole document and return its last `chars_before`
/// characters.
pub fn force_grab(
    clipboard: &dyn ClipboardProvider,
    input: &dyn InputSynthesizer,
    timings: &Timings,
    chars_before: usize,
) -> Result<String, TierFailure> {
    with_clipboard(clipboard, |guard| {
        guard.clipboard().write("")?;

        input.send_combo(&SELECT_ALL).map_err(TierFailure::Synthesis)?;
        thread::sleep(timings.select_all_settle);

        let copied = input
            .send_combo(&COPY)
            .map_err(TierFailure::Synthesis)
            .map(|()| {
                thread::sleep(timings.force_copy_settle);
                guard.clipboard().read().unwrap_or_else(|e| {
                    tracing::debug!(error = %e, "clipboard unreadable after force copy");
                    String::new()
                })
            });

        // Deselect whenever select-all went out, even if the copy failed.
        if let Err(e) = input.send_key(Key::Right, 1) {
            tracing::debug!(error = %e, "deselect after force grab failed");
        }

        let copied = sanitize(&copied?);
        if copied.is_empty() {
            return Err(TierFailure::ClipboardReadEmpty);
        }
        Ok(tail(&copied, chars_before).to_string())
    })
}
