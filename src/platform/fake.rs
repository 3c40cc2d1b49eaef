//! Scripted platform doubles for tests.
//!
//! [`FakeDesktop`] plays clipboard, keyboard, and window manager at once
//! so copy chords can move "selected" document text into the clipboard.
//! [`FakeTree`] is an accessibility tree over a linear char offset space.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::context::guard::input_lock_held;

use super::{
    AccessibilityProvider, ClipboardProvider, Endpoint, ForegroundWindowProvider,
    InputSynthesizer, Key, PlatformError,
};

/// Mutable state behind a [`FakeDesktop`].
#[derive(Debug, Default)]
pub struct DesktopState {
    pub clipboard: String,
    pub fail_clipboard_reads: bool,
    pub fail_input: bool,
    /// Fail only this chord, after recording it.
    pub fail_combo: Option<Vec<Key>>,
    pub title: Option<String>,
    /// Full content of the focused document.
    pub document: String,
    /// Text the user selected by hand.
    pub selection: String,
    pub all_selected: bool,
    /// Every synthesized combo or key, e.g. `"combo Control+C"`.
    pub events: Vec<String>,
    pub clipboard_writes: Vec<String>,
    /// Whether the input lock was held, per synthesized event or
    /// clipboard write, in call order.
    pub lock_held: Vec<bool>,
}

#[derive(Debug, Default)]
pub struct FakeDesktop {
    state: Mutex<DesktopState>,
}

impl FakeDesktop {
    pub fn with(setup: impl FnOnce(&mut DesktopState)) -> Arc<Self> {
        let desktop = Self::default();
        setup(&mut desktop.state());
        Arc::new(desktop)
    }

    pub fn state(&self) -> MutexGuard<'_, DesktopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    pub fn clipboard(&self) -> String {
        self.state().clipboard.clone()
    }
}

impl ClipboardProvider for FakeDesktop {
    fn read(&self) -> Result<String, PlatformError> {
        let state = self.state();
        if state.fail_clipboard_reads {
            return Err(PlatformError::Clipboard("read refused".into()));
        }
        Ok(state.clipboard.clone())
    }

    fn write(&self, text: &str) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.lock_held.push(input_lock_held());
        state.clipboard_writes.push(text.to_string());
        state.clipboard = text.to_string();
        Ok(())
    }
}

impl InputSynthesizer for FakeDesktop {
    fn send_combo(&self, keys: &[Key]) -> Result<(), PlatformError> {
        let mut state = self.state();
        let names: Vec<String> = keys.iter().map(|k| format!("{k:?}")).collect();
        state.events.push(format!("combo {}", names.join("+")));
        state.lock_held.push(input_lock_held());
        if state.fail_input || state.fail_combo.as_deref() == Some(keys) {
            return Err(PlatformError::Input("synthesis refused".into()));
        }

        match keys {
            [Key::Control, Key::A] => state.all_selected = true,
            [Key::Control, Key::C] => {
                let copied = if state.all_selected {
                    state.document.clone()
                } else {
                    state.selection.clone()
                };
                // Copying an empty selection leaves the clipboard alone.
                if !copied.is_empty() {
                    state.clipboard = copied;
                }
            }
            [Key::Control, Key::V] => {
                let pasted = state.clipboard.clone();
                state.document.push_str(&pasted);
            }
            _ => {}
        }
        Ok(())
    }

    fn send_key(&self, key: Key, repeat: u32) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.events.push(format!("key {key:?} x{repeat}"));
        state.lock_held.push(input_lock_held());
        if state.fail_input {
            return Err(PlatformError::Input("synthesis refused".into()));
        }

        match key {
            Key::Right | Key::Left => {
                state.all_selected = false;
                state.selection.clear();
            }
            Key::Backspace => {
                for _ in 0..repeat {
                    state.document.pop();
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl ForegroundWindowProvider for FakeDesktop {
    fn title(&self) -> Result<String, PlatformError> {
        self.state()
            .title
            .clone()
            .ok_or_else(|| PlatformError::Window("no active window".into()))
    }
}

/// A document exposed through a text capability.
#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    pub text: String,
    /// Selection ranges as char offsets `(start, end)`.
    pub selection: Vec<(usize, usize)>,
    pub fail_selection: bool,
    pub fail_document_range: bool,
    pub fail_selected_text: bool,
}

impl FakeDocument {
    /// `text` with a single selection `start..end`.
    pub fn selected(text: &str, start: usize, end: usize) -> Self {
        Self {
            text: text.to_string(),
            selection: vec![(start, end)],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeControl {
    pub name: String,
    pub class: String,
    pub parent: Option<usize>,
    pub document: Option<FakeDocument>,
    /// `Err` simulates a value read that throws.
    pub value: Option<Result<String, String>>,
}

impl FakeControl {
    pub fn new(name: &str, class: &str) -> Self {
        Self {
            name: name.to_string(),
            class: class.to_string(),
            ..Self::default()
        }
    }

    pub fn child_of(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_document(mut self, document: FakeDocument) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_value(mut self, value: Result<&str, &str>) -> Self {
        self.value = Some(value.map(str::to_string).map_err(str::to_string));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeRange {
    control: usize,
    start: usize,
    end: usize,
    from_selection: bool,
}

/// Accessibility tree of [`FakeControl`]s addressed by index.
#[derive(Debug, Default)]
pub struct FakeTree {
    pub controls: Vec<FakeControl>,
    pub focused: Option<usize>,
    pub fail_enter: bool,
    entered: AtomicUsize,
    left: AtomicUsize,
}

impl FakeTree {
    /// Append a control and return its index.
    pub fn push(&mut self, control: FakeControl) -> usize {
        self.controls.push(control);
        self.controls.len() - 1
    }

    /// Append a control and focus it.
    pub fn push_focused(&mut self, control: FakeControl) -> usize {
        let idx = self.push(control);
        self.focused = Some(idx);
        idx
    }

    /// `(enter_thread calls, leave_thread calls)`.
    pub fn scope_counts(&self) -> (usize, usize) {
        (self.entered.load(Ordering::SeqCst), self.left.load(Ordering::SeqCst))
    }

    fn control(&self, idx: usize) -> Result<&FakeControl, PlatformError> {
        self.controls
            .get(idx)
            .ok_or_else(|| PlatformError::Accessibility(format!("stale control {idx}")))
    }

    fn document(&self, idx: usize) -> Result<&FakeDocument, PlatformError> {
        self.control(idx)?
            .document
            .as_ref()
            .ok_or_else(|| PlatformError::Accessibility(format!("control {idx} has no document")))
    }
}

impl AccessibilityProvider for FakeTree {
    type Control = usize;
    type TextPattern = usize;
    type ValuePattern = usize;
    type Range = FakeRange;

    fn enter_thread(&self) -> Result<(), PlatformError> {
        if self.fail_enter {
            return Err(PlatformError::Accessibility("interop init failed".into()));
        }
        self.entered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn leave_thread(&self) {
        self.left.fetch_add(1, Ordering::SeqCst);
    }

    fn focused_control(&self) -> Result<Option<usize>, PlatformError> {
        Ok(self.focused)
    }

    fn parent(&self, control: &usize) -> Result<Option<usize>, PlatformError> {
        Ok(self.control(*control)?.parent)
    }

    fn name(&self, control: &usize) -> Result<String, PlatformError> {
        Ok(self.control(*control)?.name.clone())
    }

    fn class_name(&self, control: &usize) -> Result<String, PlatformError> {
        Ok(self.control(*control)?.class.clone())
    }

    fn text_capability(&self, control: &usize) -> Option<usize> {
        self.controls.get(*control)?.document.as_ref().map(|_| *control)
    }

    fn value_capability(&self, control: &usize) -> Option<usize> {
        self.controls.get(*control)?.value.as_ref().map(|_| *control)
    }

    fn value(&self, pattern: &usize) -> Result<String, PlatformError> {
        match &self.control(*pattern)?.value {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(e)) => Err(PlatformError::Accessibility(e.clone())),
            None => Err(PlatformError::Accessibility("no value".into())),
        }
    }

    fn selection(&self, pattern: &usize) -> Result<Vec<FakeRange>, PlatformError> {
        let document = self.document(*pattern)?;
        if document.fail_selection {
            return Err(PlatformError::Accessibility("GetSelection failed".into()));
        }
        Ok(document
            .selection
            .iter()
            .map(|&(start, end)| FakeRange {
                control: *pattern,
                start,
                end,
                from_selection: true,
            })
            .collect())
    }

    fn document_range(&self, pattern: &usize) -> Result<FakeRange, PlatformError> {
        let document = self.document(*pattern)?;
        if document.fail_document_range {
            return Err(PlatformError::Accessibility("DocumentRange failed".into()));
        }
        Ok(FakeRange {
            control: *pattern,
            start: 0,
            end: document.text.chars().count(),
            from_selection: false,
        })
    }

    fn clone_range(&self, range: &FakeRange) -> Result<FakeRange, PlatformError> {
        Ok(*range)
    }

    fn move_endpoint_to(
        &self,
        range: &mut FakeRange,
        endpoint: Endpoint,
        target: &FakeRange,
        target_endpoint: Endpoint,
    ) -> Result<(), PlatformError> {
        let pos = match target_endpoint {
            Endpoint::Start => target.start,
            Endpoint::End => target.end,
        };
        // A range whose endpoints cross collapses onto the moved endpoint.
        match endpoint {
            Endpoint::Start => {
                range.start = pos;
                range.end = range.end.max(pos);
            }
            Endpoint::End => {
                range.end = pos;
                range.start = range.start.min(pos);
            }
        }
        Ok(())
    }

    fn text(&self, range: &FakeRange, max_len: Option<usize>) -> Result<String, PlatformError> {
        let document = self.document(range.control)?;
        if range.from_selection && document.fail_selected_text {
            return Err(PlatformError::Accessibility("GetText failed".into()));
        }
        let len = range.end.saturating_sub(range.start);
        Ok(document
            .text
            .chars()
            .skip(range.start)
            .take(max_len.map_or(len, |max| max.min(len)))
            .collect())
    }
}
