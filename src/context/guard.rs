//! Clipboard snapshot/restore and the process-wide input lock.
//!
//! The clipboard and the synthetic keyboard are shared by every
//! acquisition and by the text injector. Anything that mutates either
//! holds [`input_lock`] for the whole sequence; clipboard-mutating
//! sequences do so through a [`ClipboardGuard`], which also puts the
//! original clipboard text back when it is dropped.

use std::sync::{Mutex, MutexGuard, PoisonError};
#[cfg(test)]
use std::sync::TryLockError;

use crate::platform::ClipboardProvider;

static INPUT_LOCK: Mutex<()> = Mutex::new(());

/// Take the process-wide clipboard/keyboard lock.
///
/// A panic while the lock was held does not poison it for later callers.
pub fn input_lock() -> MutexGuard<'static, ()> {
    INPUT_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Whether some thread currently holds the input lock.
#[cfg(test)]
pub fn input_lock_held() -> bool {
    matches!(INPUT_LOCK.try_lock(), Err(TryLockError::WouldBlock))
}

/// Scoped clipboard access: snapshot on entry, restore on drop.
pub struct ClipboardGuard<'a> {
    clipboard: &'a dyn ClipboardProvider,
    snapshot: String,
    // Released after the restore in `drop`.
    _lock: MutexGuard<'static, ()>,
}

impl<'a> ClipboardGuard<'a> {
    /// Take the input lock and snapshot the clipboard. An unreadable
    /// clipboard snapshots as empty text.
    pub fn acquire(clipboard: &'a dyn ClipboardProvider) -> Self {
        let lock = input_lock();
        let snapshot = clipboard.read().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "clipboard snapshot unreadable, restoring empty");
            String::new()
        });
        Self {
            clipboard,
            snapshot,
            _lock: lock,
        }
    }

    /// The guarded clipboard.
    pub fn clipboard(&self) -> &dyn ClipboardProvider {
        self.clipboard
    }

    /// Clipboard text at the time the guard was taken.
    #[cfg(test)]
    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }
}

impl Drop for ClipboardGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.clipboard.write(&self.snapshot) {
            tracing::warn!(error = %e, "failed to restore clipboard");
        }
    }
}

/// Run `body` inside a [`ClipboardGuard`]. The clipboard is restored
/// however `body` exits, including by panic.
pub fn with_clipboard<T>(
    clipboard: &dyn ClipboardProvider,
    body: impl FnOnce(&ClipboardGuard<'_>) -> T,
) -> T {
    let guard = ClipboardGuard::acquire(clipboard);
    body(&guard)
}
