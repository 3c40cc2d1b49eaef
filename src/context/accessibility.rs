//! Tiers 1 and 1b — accessibility text ranges and scalar values.
//!
//! Candidates are the focused control followed by up to `max_ancestors`
//! of its ancestors. The first candidate exposing a text capability
//! wins, closest to focus rather than richest in text. Without any text
//! capability the same candidates are probed for a scalar value.

use crate::platform::{AccessibilityProvider, Endpoint, PlatformError};

use super::text::{head, sanitize, tail};
use super::{ContextResult, Fallback, TierFailure};

/// Ancestors of the focused control considered by default.
pub const MAX_ANCESTORS: usize = 3;

/// `"<name> (<class>)"`, or the class alone when the control is unnamed.
fn display_name<A: AccessibilityProvider>(provider: &A, control: &A::Control) -> String {
    let name = provider.name(control).unwrap_or_default();
    let class = provider.class_name(control).unwrap_or_default();
    if name.is_empty() {
        class
    } else {
        format!("{name} ({class})")
    }
}

/// The focused control, then its ancestors nearest first.
fn candidates<A: AccessibilityProvider>(
    provider: &A,
    focused: A::Control,
    max_ancestors: usize,
) -> Vec<A::Control> {
    let mut controls = Vec::with_capacity(max_ancestors + 1);
    controls.push(focused);
    for _ in 0..max_ancestors {
        let Some(last) = controls.last() else { break };
        match provider.parent(last) {
            Ok(Some(parent)) => controls.push(parent),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "ancestor walk stopped");
                break;
            }
        }
    }
    controls
}

/// Degrade a failed per-field read to empty text.
fn field(name: &'static str, read: Result<String, PlatformError>) -> String {
    read.unwrap_or_else(|e| {
        let failure = TierFailure::RangeExtraction(e);
        tracing::debug!(field = name, error = %failure, "context field unavailable");
        String::new()
    })
}

/// Document text from the start up to `edge` of the caret range, or from
/// that edge to the end.
fn document_text<A: AccessibilityProvider>(
    provider: &A,
    pattern: &A::TextPattern,
    caret: &A::Range,
    moved: Endpoint,
    edge: Endpoint,
) -> Result<String, PlatformError> {
    let document = provider.document_range(pattern)?;
    let mut range = provider.clone_range(&document)?;
    provider.move_endpoint_to(&mut range, moved, caret, edge)?;
    provider.text(&range, None)
}

/// Tier 1: selection and surrounding text through a text capability.
///
/// Falls through to [`locate_value`] over the same candidates when no
/// candidate has a text capability. Once a capability is found, the
/// three text fields are read independently and each degrades to empty
/// on failure.
pub fn locate<A: AccessibilityProvider>(
    provider: &A,
    max_ancestors: usize,
    chars_before: usize,
    chars_after: usize,
) -> Result<ContextResult, TierFailure> {
    let focused = provider
        .focused_control()?
        .ok_or(TierFailure::NoFocusedControl)?;
    let app_name = display_name(provider, &focused);
    let candidates = candidates(provider, focused, max_ancestors);

    let Some(pattern) = candidates.iter().find_map(|c| provider.text_capability(c)) else {
        return locate_value(provider, &candidates, app_name, chars_before);
    };

    // Only the first range counts; a caret is an empty range.
    let caret = provider
        .selection(&pattern)?
        .into_iter()
        .next()
        .ok_or(TierFailure::EmptySelection)?;

    let selected = field("selected", provider.text(&caret, None).map(|t| sanitize(&t)));

    let before = field(
        "before",
        document_text(provider, &pattern, &caret, Endpoint::End, Endpoint::Start)
            .map(|t| tail(&sanitize(&t), chars_before).to_string()),
    );

    let after = field(
        "after",
        document_text(provider, &pattern, &caret, Endpoint::Start, Endpoint::End)
            .map(|t| head(&sanitize(&t), chars_after).to_string()),
    );

    Ok(ContextResult {
        before,
        after,
        selected,
        ..ContextResult::supported(app_name)
    })
}

/// Tier 1b: the first readable scalar value among `candidates`.
///
/// Value-only controls carry no caret position, so the caret is assumed
/// to sit at the end and the whole value becomes `before`.
pub fn locate_value<A: AccessibilityProvider>(
    provider: &A,
    candidates: &[A::Control],
    app_name: String,
    chars_before: usize,
) -> Result<ContextResult, TierFailure> {
    for control in candidates {
        let Some(pattern) = provider.value_capability(control) else {
            continue;
        };
        match provider.value(&pattern) {
            Ok(value) => {
                let value = sanitize(&value);
                return Ok(ContextResult {
                    before: tail(&value, chars_before).to_string(),
                    fallback: Some(Fallback::ValuePattern),
                    ..ContextResult::supported(app_name)
                });
            }
            Err(e) => tracing::debug!(error = %e, "value read failed, trying next candidate"),
        }
    }
    Err(TierFailure::CapabilityAbsent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{FakeControl, FakeDocument, FakeTree};

    fn single(control: FakeControl) -> FakeTree {
        let mut tree = FakeTree::default();
        tree.push_focused(control);
        tree
    }

    #[test]
    fn selection_with_surrounding_text() {
        let tree = single(
            FakeControl::new("Doc", "Edit").with_document(FakeDocument::selected("helloabworld", 5, 7)),
        );

        let result = locate(&tree, MAX_ANCESTORS, 3, 3).unwrap();

        assert!(result.supported);
        assert_eq!(result.before, "llo");
        assert_eq!(result.after, "wor");
        assert_eq!(result.selected, "ab");
        assert_eq!(result.app_name, "Doc (Edit)");
        assert_eq!(result.fallback, None);
        assert_eq!(result.reason, None);
    }

    #[test]
    fn caret_without_selection() {
        let tree = single(FakeControl::new("", "Edit").with_document(FakeDocument::selected("hello world", 5, 5)));

        let result = locate(&tree, MAX_ANCESTORS, 50, 50).unwrap();

        assert_eq!(result.before, "hello");
        assert_eq!(result.after, " world");
        assert_eq!(result.selected, "");
        assert_eq!(result.app_name, "Edit");
    }

    #[test]
    fn before_and_after_are_sanitized_before_truncation() {
        let tree = single(FakeControl::new("", "Edit").with_document(FakeDocument::selected(
            "ab\u{FFFC}c|\u{FFF9}de",
            4,
            4,
        )));

        let result = locate(&tree, MAX_ANCESTORS, 3, 2).unwrap();

        assert_eq!(result.before, "abc");
        assert_eq!(result.after, "|d");
    }

    #[test]
    fn closest_text_capability_wins() {
        let mut tree = FakeTree::default();
        let root = tree.push(
            FakeControl::new("Window", "Frame").with_document(FakeDocument::selected("a much longer document", 0, 0)),
        );
        let pane = tree.push(FakeControl::new("Pane", "Pane").child_of(root).with_document(FakeDocument::selected("pane", 4, 4)));
        tree.push_focused(FakeControl::new("Button", "Button").child_of(pane));

        let result = locate(&tree, MAX_ANCESTORS, 50, 50).unwrap();

        assert_eq!(result.before, "pane");
        // The display name still comes from the focused control.
        assert_eq!(result.app_name, "Button (Button)");
    }

    #[test]
    fn ancestors_beyond_limit_are_ignored() {
        let mut tree = FakeTree::default();
        let mut parent = tree.push(FakeControl::new("", "Root").with_document(FakeDocument::selected("far", 3, 3)));
        for _ in 0..3 {
            parent = tree.push(FakeControl::new("", "Group").child_of(parent));
        }
        tree.push_focused(FakeControl::new("", "Leaf").child_of(parent));

        assert!(matches!(
            locate(&tree, MAX_ANCESTORS, 50, 50),
            Err(TierFailure::CapabilityAbsent)
        ));
        assert_eq!(locate(&tree, 4, 50, 50).unwrap().before, "far");
    }

    #[test]
    fn empty_selection_fails_tier() {
        let tree = single(FakeControl::new("", "Edit").with_document(FakeDocument {
            text: "text".into(),
            ..FakeDocument::default()
        }));

        assert!(matches!(
            locate(&tree, MAX_ANCESTORS, 50, 50),
            Err(TierFailure::EmptySelection)
        ));
    }

    #[test]
    fn selection_error_fails_tier() {
        let tree = single(FakeControl::new("", "Edit").with_document(FakeDocument {
            fail_selection: true,
            ..FakeDocument::selected("text", 0, 0)
        }));

        assert!(matches!(
            locate(&tree, MAX_ANCESTORS, 50, 50),
            Err(TierFailure::Platform(_))
        ));
    }

    #[test]
    fn only_first_selection_range_is_used() {
        let tree = single(FakeControl::new("", "Edit").with_document(FakeDocument {
            text: "one two three".into(),
            selection: vec![(0, 3), (8, 13)],
            ..FakeDocument::default()
        }));

        let result = locate(&tree, MAX_ANCESTORS, 50, 50).unwrap();

        assert_eq!(result.selected, "one");
        assert_eq!(result.before, "");
        assert_eq!(result.after, " two three");
    }

    #[test]
    fn document_range_failure_degrades_before_and_after_only() {
        let tree = single(FakeControl::new("", "Edit").with_document(FakeDocument {
            fail_document_range: true,
            ..FakeDocument::selected("helloabworld", 5, 7)
        }));

        let result = locate(&tree, MAX_ANCESTORS, 3, 3).unwrap();

        assert!(result.supported);
        assert_eq!(result.selected, "ab");
        assert_eq!(result.before, "");
        assert_eq!(result.after, "");
    }

    #[test]
    fn selected_text_failure_degrades_selected_only() {
        let tree = single(FakeControl::new("", "Edit").with_document(FakeDocument {
            fail_selected_text: true,
            ..FakeDocument::selected("helloabworld", 5, 7)
        }));

        let result = locate(&tree, MAX_ANCESTORS, 3, 3).unwrap();

        assert_eq!(result.selected, "");
        assert_eq!(result.before, "llo");
        assert_eq!(result.after, "wor");
    }

    #[test]
    fn no_focused_control() {
        let tree = FakeTree::default();
        assert!(matches!(
            locate(&tree, MAX_ANCESTORS, 50, 50),
            Err(TierFailure::NoFocusedControl)
        ));
    }

    #[test]
    fn value_fallback_keeps_tail_as_before() {
        let tree = single(FakeControl::new("Address", "Omnibox").with_value(Ok("typed text here")));

        let result = locate(&tree, MAX_ANCESTORS, 5, 50).unwrap();

        assert!(result.supported);
        assert_eq!(result.before, " here");
        assert_eq!(result.after, "");
        assert_eq!(result.selected, "");
        assert_eq!(result.fallback, Some(Fallback::ValuePattern));
        assert_eq!(result.app_name, "Address (Omnibox)");
    }

    #[test]
    fn text_capability_on_ancestor_beats_value_on_focus() {
        let mut tree = FakeTree::default();
        let parent = tree.push(FakeControl::new("", "Doc").with_document(FakeDocument::selected("doc", 3, 3)));
        tree.push_focused(FakeControl::new("", "Edit").child_of(parent).with_value(Ok("value")));

        let result = locate(&tree, MAX_ANCESTORS, 50, 50).unwrap();

        assert_eq!(result.before, "doc");
        assert_eq!(result.fallback, None);
    }

    #[test]
    fn unreadable_value_moves_to_next_candidate() {
        let mut tree = FakeTree::default();
        let parent = tree.push(FakeControl::new("", "Group").with_value(Ok("from parent")));
        tree.push_focused(FakeControl::new("", "Edit").child_of(parent).with_value(Err("stale")));

        let result = locate(&tree, MAX_ANCESTORS, 50, 50).unwrap();

        assert_eq!(result.before, "from parent");
    }

    #[test]
    fn value_is_sanitized() {
        let tree = single(FakeControl::new("", "Edit").with_value(Ok("a\u{FFFC}b")));
        assert_eq!(locate(&tree, MAX_ANCESTORS, 50, 50).unwrap().before, "ab");
    }
}
