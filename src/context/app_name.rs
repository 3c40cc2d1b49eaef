//! Foreground application name, best-effort.

use crate::platform::ForegroundWindowProvider;

/// Placeholder used whenever the title cannot be determined.
pub const UNKNOWN_APP: &str = "Unknown";

/// Title of the focused top-level window, or [`UNKNOWN_APP`].
///
/// Never fails: a missing display, an unset title, or a query error all
/// resolve to the placeholder so acquisition can continue.
pub fn resolve(window: &dyn ForegroundWindowProvider) -> String {
    match window.title() {
        Ok(title) if !title.is_empty() => title,
        Ok(_) => UNKNOWN_APP.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "foreground title unavailable");
            UNKNOWN_APP.to_string()
        }
    }
}
