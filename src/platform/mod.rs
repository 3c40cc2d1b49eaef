//! Platform abstraction — the desktop surfaces the context engine consumes.
//!
//! Every platform-specific behavior (accessibility tree inspection,
//! clipboard access, key synthesis, foreground window queries) sits
//! behind one of the traits in this module. Platform adapters implement
//! one or more of them; `main` composes them at startup.

pub mod accessibility;
pub mod atspi;
#[cfg(test)]
pub mod fake;
pub mod headless;
pub mod x11;
pub mod xclip;

pub use accessibility::{AccessibilityProvider, Endpoint};

/// Errors returned by platform adapters.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Accessibility tree query failed (e.g. element went stale,
    /// interop layer not initialized on this thread).
    #[error("accessibility: {0}")]
    Accessibility(String),

    /// Clipboard operation failed (e.g. xclip not found, pipe error,
    /// no text target available).
    #[error("clipboard: {0}")]
    Clipboard(String),

    /// Key synthesis failed (e.g. no keycode for keysym, XTEST request
    /// rejected).
    #[error("input: {0}")]
    Input(String),

    /// Foreground window query failed.
    #[error("window: {0}")]
    Window(String),

    /// Display connection could not be established.
    #[error("display: {0}")]
    Display(String),
}

/// Keys the engine and injector synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Control,
    A,
    C,
    V,
    Left,
    Right,
    Backspace,
}

impl Key {
    pub const ALL: [Key; 7] = [
        Key::Control,
        Key::A,
        Key::C,
        Key::V,
        Key::Left,
        Key::Right,
        Key::Backspace,
    ];

    /// The X11 keysym for this key.
    pub fn keysym(self) -> u32 {
        match self {
            Key::Control => 0xffe3, // Control_L
            Key::A => 0x0061,
            Key::C => 0x0063,
            Key::V => 0x0076,
            Key::Left => 0xff51,
            Key::Right => 0xff53,
            Key::Backspace => 0xff08,
        }
    }
}

/// Select-all chord.
pub const SELECT_ALL: [Key; 2] = [Key::Control, Key::A];
/// Copy chord.
pub const COPY: [Key; 2] = [Key::Control, Key::C];
/// Paste chord.
pub const PASTE: [Key; 2] = [Key::Control, Key::V];

/// Reads and writes the system clipboard as text.
pub trait ClipboardProvider: Send + Sync {
    /// Read the current clipboard text.
    fn read(&self) -> Result<String, PlatformError>;

    /// Replace the clipboard content with `text`.
    fn write(&self, text: &str) -> Result<(), PlatformError>;
}

/// Synthesizes keyboard input into whatever window holds focus.
///
/// Callers must hold the process-wide input lock
/// (`context::guard::input_lock`) while synthesizing.
pub trait InputSynthesizer: Send + Sync {
    /// Press every key in `keys` in order, then release them in reverse.
    fn send_combo(&self, keys: &[Key]) -> Result<(), PlatformError>;

    /// Press and release `key` `repeat` times.
    fn send_key(&self, key: Key, repeat: u32) -> Result<(), PlatformError>;
}

/// Reads the title of the focused top-level window.
pub trait ForegroundWindowProvider: Send + Sync {
    fn title(&self) -> Result<String, PlatformError>;
}
