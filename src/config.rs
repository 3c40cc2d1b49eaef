//! Runtime settings with their defaults.
//!
//! All delays are fixed: no tier waits adaptively, so the worst-case
//! latency of an acquisition is the sum of the delays on its path.

use std::time::Duration;

use crate::context::accessibility::MAX_ANCESTORS;

/// Settle delays around synthesized clipboard operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// After clearing the clipboard, before the copy chord (tier 2).
    pub clear_settle: Duration,
    /// After the copy chord, before reading the clipboard (tier 2).
    pub copy_settle: Duration,
    /// After the select-all chord (tier 3).
    pub select_all_settle: Duration,
    /// After the copy chord in a force grab (tier 3).
    pub force_copy_settle: Duration,
    /// After writing injected text, before the paste chord.
    pub paste_settle: Duration,
    /// After the paste chord, before restoring the clipboard.
    pub paste_restore_settle: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            clear_settle: Duration::from_millis(20),
            copy_settle: Duration::from_millis(120),
            select_all_settle: Duration::from_millis(50),
            force_copy_settle: Duration::from_millis(50),
            paste_settle: Duration::from_millis(10),
            paste_restore_settle: Duration::from_millis(50),
        }
    }
}

impl Timings {
    /// No delays at all, for tests against in-memory platforms.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            clear_settle: Duration::ZERO,
            copy_settle: Duration::ZERO,
            select_all_settle: Duration::ZERO,
            force_copy_settle: Duration::ZERO,
            paste_settle: Duration::ZERO,
            paste_restore_settle: Duration::ZERO,
        }
    }
}

/// Context engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Ancestors of the focused control probed for capabilities.
    pub max_ancestors: usize,
    pub timings: Timings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_ancestors: MAX_ANCESTORS,
            timings: Timings::default(),
        }
    }
}

/// Bridge settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Lookbehind for context pushed by the bridge.
    pub chars_before: usize,
    /// Lookahead for context pushed by the bridge.
    pub chars_after: usize,
    /// Delay before the automatic context push after an injection, so
    /// the target application can process the input first.
    pub push_delay: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            chars_before: 50,
            chars_after: 50,
            push_delay: Duration::from_millis(100),
        }
    }
}
