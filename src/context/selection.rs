//! Tier 2 — copy whatever the user has selected by hand.
//!
//! No positional information is available, so only `selected` is
//! populated by the caller.

use std::thread;

use crate::config::Timings;
use crate::platform::{COPY, ClipboardProvider, InputSynthesizer};

use super::TierFailure;
use super::guard::with_clipboard;
use super::text::sanitize;

/// Clear the clipboard, send the copy chord, and read back the result.
///
/// The clipboard is cleared first so an empty selection cannot be
/// mistaken for the previous clipboard content.
pub fn grab_selection(
    clipboard: &dyn ClipboardProvider,
    input: &dyn InputSynthesizer,
    timings: &Timings,
) -> Result<String, TierFailure> {
    with_clipboard(clipboard, |guard| {
        guard.clipboard().write("")?;
        thread::sleep(timings.clear_settle);

        input.send_combo(&COPY).map_err(TierFailure::Synthesis)?;
        thread::sleep(timings.copy_settle);

        let copied = guard.clipboard().read().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "clipboard unreadable after copy");
            String::new()
        });
        let copied = sanitize(&copied);
        if copied.is_empty() {
            return Err(TierFailure::ClipboardReadEmpty);
        }
        Ok(copied)
    })
}
