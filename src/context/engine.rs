//! The tier cascade.
//!
//! ```text
//! Idle -> TryAccessibility -ok-> Done
//!              | fail
//!              v
//!         TryClipboardSelection -ok-> Done
//!              | fail, force
//!              v
//!         TryForceGrab -> Done
//! ```
//!
//! Every tier is tried at most once per call. Tier failures are logged
//! and advance the cascade; `acquire` always returns a result.

use std::sync::Arc;

use crate::config::EngineSettings;
use crate::platform::{
    AccessibilityProvider, ClipboardProvider, ForegroundWindowProvider, InputSynthesizer,
};

use super::{
    ContextRequest, ContextResult, Fallback, TierFailure, UNSUPPORTED_REASON, accessibility,
    app_name, force, selection,
};

/// Thread-affine accessibility initialization for one acquisition.
struct ThreadScope<'a, A: AccessibilityProvider> {
    provider: &'a A,
}

impl<'a, A: AccessibilityProvider> ThreadScope<'a, A> {
    fn enter(provider: &'a A) -> Result<Self, TierFailure> {
        provider.enter_thread()?;
        Ok(Self { provider })
    }
}

impl<A: AccessibilityProvider> Drop for ThreadScope<'_, A> {
    fn drop(&mut self) {
        self.provider.leave_thread();
    }
}

/// Acquires caret context from the focused application.
pub struct ContextEngine<A> {
    accessibility: A,
    clipboard: Arc<dyn ClipboardProvider>,
    input: Arc<dyn InputSynthesizer>,
    window: Arc<dyn ForegroundWindowProvider>,
    settings: EngineSettings,
}

impl<A: AccessibilityProvider> ContextEngine<A> {
    pub fn new(
        accessibility: A,
        clipboard: Arc<dyn ClipboardProvider>,
        input: Arc<dyn InputSynthesizer>,
        window: Arc<dyn ForegroundWindowProvider>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            accessibility,
            clipboard,
            input,
            window,
            settings,
        }
    }

    /// Run the cascade once.
    ///
    /// Blocks for the fixed settle delays of the clipboard tiers; call it
    /// from a blocking worker, not from an async task.
    pub fn acquire(&self, request: ContextRequest) -> ContextResult {
        let app = app_name::resolve(&*self.window);
        // The interop scope only needs to cover the accessibility tier.
        let tier1 = ThreadScope::enter(&self.accessibility).and_then(|_scope| {
            accessibility::locate(
                &self.accessibility,
                self.settings.max_ancestors,
                request.chars_before,
                request.chars_after,
            )
        });
        match tier1 {
            Ok(result) => {
                tracing::info!(
                    app = %result.app_name,
                    before_len = result.before.chars().count(),
                    after_len = result.after.chars().count(),
                    fallback = ?result.fallback,
                    "context via accessibility"
                );
                return result;
            }
            Err(failure) => tracing::debug!(tier = "accessibility", reason = %failure, "tier produced nothing"),
        }

        match selection::grab_selection(&*self.clipboard, &*self.input, &self.settings.timings) {
            Ok(selected) => {
                tracing::info!(app = %app, selected_len = selected.chars().count(), "context via clipboard selection");
                return ContextResult {
                    selected,
                    ..ContextResult::supported(app)
                };
            }
            Err(failure) => tracing::debug!(tier = "selection", reason = %failure, "tier produced nothing"),
        }

        if request.force {
            tracing::info!(app = %app, "attempting force grab");
            match force::force_grab(
                &*self.clipboard,
                &*self.input,
                &self.settings.timings,
                request.chars_before,
            ) {
                Ok(before) => {
                    tracing::info!(app = %app, before_len = before.chars().count(), "context via force grab");
                    return ContextResult {
                        before,
                        fallback: Some(Fallback::ForceGrab),
                        ..ContextResult::supported(app)
                    };
                }
                Err(failure) => tracing::warn!(tier = "force", reason = %failure, "force grab failed"),
            }
        } else {
            tracing::warn!(app = %app, reason = UNSUPPORTED_REASON, "no context available");
        }

        ContextResult::unsupported(app, UNSUPPORTED_REASON)
    }
}
