//! Context acquisition — text around the caret of the focused application.
//!
//! The engine tries a cascade of strategies, each with different
//! semantics:
//!
//! 1. accessibility text ranges (`before`/`after`/`selected`),
//! 1b. accessibility scalar value (`before` only, tagged `ValuePattern`),
//! 2. copy of the user's current selection (`selected` only),
//! 3. opt-in select-all + copy (`before` only, tagged `ForceGrab`).
//!
//! The first tier that produces something wins. Tiers that touch the
//! clipboard or synthesize keys do so inside a [`guard::ClipboardGuard`],
//! which serializes them process-wide and restores the clipboard.

pub mod accessibility;
pub mod app_name;
pub mod engine;
pub mod force;
pub mod guard;
pub mod selection;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::platform::PlatformError;

pub use engine::ContextEngine;

/// Reason attached to a result when no tier produced context.
pub const UNSUPPORTED_REASON: &str = "TextPattern not available. Long-press Refresh to force grab.";

/// Which non-canonical tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fallback {
    /// Scalar value of a control without caret information.
    ValuePattern,
    /// Select-all capture.
    ForceGrab,
}

/// Outcome of one acquisition.
///
/// `supported == false` implies empty text fields and a `reason`;
/// `supported == true` implies no `reason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextResult {
    pub supported: bool,
    pub app_name: String,
    pub before: String,
    pub after: String,
    pub selected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ContextResult {
    /// A supported result with every text field empty.
    pub fn supported(app_name: impl Into<String>) -> Self {
        Self {
            supported: true,
            app_name: app_name.into(),
            before: String::new(),
            after: String::new(),
            selected: String::new(),
            fallback: None,
            reason: None,
        }
    }

    /// The terminal "nothing worked" result.
    pub fn unsupported(app_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            supported: false,
            reason: Some(reason.into()),
            ..Self::supported(app_name)
        }
    }
}

fn default_window() -> usize {
    50
}

/// Parameters of one acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ContextRequest {
    /// Characters of lookbehind to return.
    #[serde(default = "default_window")]
    pub chars_before: usize,
    /// Characters of lookahead to return.
    #[serde(default = "default_window")]
    pub chars_after: usize,
    /// Allow the selection-destructive select-all tier.
    #[serde(default)]
    pub force: bool,
}

impl Default for ContextRequest {
    fn default() -> Self {
        Self {
            chars_before: default_window(),
            chars_after: default_window(),
            force: false,
        }
    }
}

/// Why a tier produced no result. Never escapes the engine.
#[derive(Debug, thiserror::Error)]
pub enum TierFailure {
    #[error("no focused control")]
    NoFocusedControl,

    #[error("no candidate exposes the capability")]
    CapabilityAbsent,

    #[error("selection has no ranges")]
    EmptySelection,

    #[error("range extraction failed: {0}")]
    RangeExtraction(PlatformError),

    #[error("clipboard empty after copy")]
    ClipboardReadEmpty,

    #[error("key synthesis failed: {0}")]
    Synthesis(PlatformError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
