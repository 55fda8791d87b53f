use crate::error::{Result, SnipexError};
use arboard::Clipboard;

/// Text access through one open clipboard connection.
///
/// On X11 and Wayland the text we set is only served while the connection
/// that set it is alive, so multi-step sequences must reuse one handle.
pub trait ClipboardHandle {
    fn text(&mut self) -> Result<String>;
    fn set_text(&mut self, text: &str) -> Result<()>;
}

impl ClipboardHandle for Clipboard {
    fn text(&mut self) -> Result<String> {
        self.get_text()
            .map_err(|e| SnipexError::Clipboard(e.to_string()))
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        Clipboard::set_text(self, text).map_err(|e| SnipexError::Clipboard(e.to_string()))
    }
}

/// Open a connection to the system clipboard
pub fn open_clipboard() -> Result<Clipboard> {
    Clipboard::new().map_err(|e| SnipexError::Clipboard(e.to_string()))
}

/// Get the current clipboard content as text
pub fn get_clipboard_text() -> Result<String> {
    open_clipboard()?.text()
}

/// Clipboard text if there is any; empty and non-text contents count as none
pub fn clipboard_text_if_any() -> Option<String> {
    get_clipboard_text().ok().filter(|text| !text.is_empty())
}
