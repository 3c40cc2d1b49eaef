//! Clipboard adapter backed by the `xclip` binary.
//!
//! Reads spawn `xclip -selection clipboard -o`; writes spawn
//! `xclip -selection clipboard`, pipe the text to stdin, and wait for the
//! foreground process to exit (xclip forks a background owner that keeps
//! serving the selection).
//!
//! Both run synchronously: the engine calls them from a blocking worker
//! thread while holding the input lock.

use std::io::Write;
use std::process::{Command, Stdio};

use super::{ClipboardProvider, PlatformError};

/// System clipboard via `xclip`.
#[derive(Debug, Clone)]
pub struct XclipClipboard {
    binary: String,
}

impl XclipClipboard {
    pub fn new() -> Self {
        Self::with_binary("xclip")
    }

    /// Use a specific xclip executable.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for XclipClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardProvider for XclipClipboard {
    fn read(&self) -> Result<String, PlatformError> {
        let output = Command::new(&self.binary)
            .args(["-selection", "clipboard", "-o"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| PlatformError::Clipboard(format!("spawn {}: {e}", self.binary)))?;

        // Non-zero exit usually means no text target is currently offered.
        if !output.status.success() {
            return Err(PlatformError::Clipboard(format!(
                "{} exited with {}",
                self.binary, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn write(&self, text: &str) -> Result<(), PlatformError> {
        let mut child = Command::new(&self.binary)
            .args(["-selection", "clipboard"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PlatformError::Clipboard(format!("spawn {}: {e}", self.binary)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| PlatformError::Clipboard(format!("write stdin: {e}")))?;
            // Dropping stdin closes the pipe so xclip can finish.
        }

        let status = child
            .wait()
            .map_err(|e| PlatformError::Clipboard(format!("wait: {e}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(PlatformError::Clipboard(format!(
                "{} exited with {status}",
                self.binary
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_missing_binary_is_clipboard_error() {
        let clipboard = XclipClipboard::with_binary("/nonexistent/xclip");
        let err = clipboard.read().unwrap_err();
        assert!(matches!(err, PlatformError::Clipboard(_)));
        assert!(err.to_string().starts_with("clipboard: spawn /nonexistent/xclip"));
    }

    #[test]
    fn write_missing_binary_is_clipboard_error() {
        let clipboard = XclipClipboard::with_binary("/nonexistent/xclip");
        assert!(matches!(
            clipboard.write("hello"),
            Err(PlatformError::Clipboard(_))
        ));
    }

    #[test]
    fn read_failing_binary_reports_exit_status() {
        // `false` ignores its arguments and exits 1.
        let clipboard = XclipClipboard::with_binary("false");
        let err = clipboard.read().unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }
}
