//! The clipboard output sink.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard is unavailable: {0}")]
    Unavailable(String),

    #[error("failed to write to clipboard: {0}")]
    Write(String),
}

/// Receives the assembled prompt. Failing here never invalidates the prompt.
pub trait ClipboardSink: Send + Sync {
    fn copy_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The system clipboard via `arboard`.
///
/// On X11 and Wayland the contents are served by the owning process. A
/// short-lived process therefore only leaves the text behind when a clipboard
/// manager picks it up before exit.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| ClipboardError::Write(e.to_string()))?;
        tracing::info!("Copied {} bytes to the clipboard.", text.len());
        Ok(())
    }
}

/// A sink that drops the text, for headless runs.
pub struct DisabledClipboard;

impl ClipboardSink for DisabledClipboard {
    fn copy_text(&self, _text: &str) -> Result<(), ClipboardError> {
        tracing::debug!("Clipboard disabled; not copying prompt.");
        Ok(())
    }
}
