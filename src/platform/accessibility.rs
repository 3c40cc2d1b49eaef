//! AccessibilityProvider trait — capability queries over the focused
//! application's accessibility tree.
//!
//! Capabilities are probed explicitly: each query returns `Option` of a
//! handle instead of failing when a control does not expose the
//! capability. Handles are opaque to the engine and only live for the
//! duration of one acquisition.

use super::PlatformError;

/// One end of a text range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

/// Inspects UI elements of the application holding input focus.
///
/// Implementations are typically thread-affine: `enter_thread` must be
/// called on the acquiring thread before any other method and
/// `leave_thread` once the acquisition is done. The engine pairs the two
/// through a scope guard.
pub trait AccessibilityProvider: Send + Sync {
    /// A UI element in the target application's tree.
    type Control;
    /// A control's text-range capability.
    type TextPattern;
    /// A control's scalar value capability.
    type ValuePattern;
    /// A span of text inside a text capability's document.
    type Range;

    /// Initialize the interop layer for the calling thread.
    fn enter_thread(&self) -> Result<(), PlatformError>;

    /// Release what `enter_thread` acquired. Best-effort.
    fn leave_thread(&self);

    /// The element that currently holds keyboard focus, if any.
    fn focused_control(&self) -> Result<Option<Self::Control>, PlatformError>;

    /// The element's parent in the tree, `None` at the root.
    fn parent(&self, control: &Self::Control) -> Result<Option<Self::Control>, PlatformError>;

    /// The element's accessible name (may be empty).
    fn name(&self, control: &Self::Control) -> Result<String, PlatformError>;

    /// The element's class name (may be empty).
    fn class_name(&self, control: &Self::Control) -> Result<String, PlatformError>;

    /// The element's text-range capability, if it exposes one.
    fn text_capability(&self, control: &Self::Control) -> Option<Self::TextPattern>;

    /// The element's scalar value capability, if it exposes one.
    fn value_capability(&self, control: &Self::Control) -> Option<Self::ValuePattern>;

    /// Read the scalar value.
    fn value(&self, pattern: &Self::ValuePattern) -> Result<String, PlatformError>;

    /// The current selection as a sequence of ranges. A bare caret is a
    /// single empty range.
    fn selection(&self, pattern: &Self::TextPattern) -> Result<Vec<Self::Range>, PlatformError>;

    /// A range spanning the capability's whole document.
    fn document_range(&self, pattern: &Self::TextPattern) -> Result<Self::Range, PlatformError>;

    /// An independent copy of `range`.
    fn clone_range(&self, range: &Self::Range) -> Result<Self::Range, PlatformError>;

    /// Move `endpoint` of `range` onto `target_endpoint` of `target`.
    fn move_endpoint_to(
        &self,
        range: &mut Self::Range,
        endpoint: Endpoint,
        target: &Self::Range,
        target_endpoint: Endpoint,
    ) -> Result<(), PlatformError>;

    /// Text covered by `range`, at most `max_len` characters when given.
    fn text(&self, range: &Self::Range, max_len: Option<usize>) -> Result<String, PlatformError>;
}
