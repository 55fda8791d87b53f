//! Synthesized input into the foreground application.
//!
//! The executor only needs three capabilities: erase characters before the
//! caret, insert text at the caret, and move the caret left. `SystemInjector`
//! provides them with enigo key events and the shared clipboard; other
//! platforms or tests plug in their own `TextInjector`.

use crate::clipboard::{open_clipboard, ClipboardHandle};
use crate::config::{ExpansionConfig, InjectionMethod};
use crate::error::{Result, SnipexError};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

pub trait TextInjector: Send + Sync {
    fn delete_before_cursor(&self, count: usize) -> Result<()>;
    fn insert_text(&self, text: &str) -> Result<()>;
    fn move_cursor_left(&self, count: usize) -> Result<()>;
}

/// Create a keyboard controller
pub fn create_keyboard_controller() -> Result<Enigo> {
    Enigo::new(&Settings::default()).map_err(|err| {
        SnipexError::Injection(format!("Failed to create keyboard controller: {}", err))
    })
}

/// Click `key` `count` times.
///
/// A failed click is skipped rather than aborting the run; the last failure
/// is reported once all clicks have been attempted.
fn click_repeatedly(keyboard: &mut Enigo, key: Key, count: usize, interval: Duration) -> Result<()> {
    let mut last_error = None;

    for _ in 0..count {
        if let Err(err) = keyboard.key(key, Direction::Click) {
            warn!(error = %err, key = ?key, "Synthesized key press failed");
            last_error = Some(err);
        }
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    match last_error {
        Some(err) => Err(SnipexError::Injection(format!(
            "Failed to press {:?}: {}",
            key, err
        ))),
        None => Ok(()),
    }
}

/// Paste shortcut for the current platform
fn paste_modifier() -> Key {
    if cfg!(target_os = "macos") {
        Key::Meta
    } else {
        Key::Control
    }
}

/// Type text line by line so embedded newlines become Return presses
pub fn type_text_with_formatting(keyboard: &mut Enigo, text: &str) -> Result<()> {
    // Long lines are split to avoid overwhelming the input queue
    const CHUNK_SIZE: usize = 512;

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            keyboard
                .key(Key::Return, Direction::Click)
                .map_err(|err| SnipexError::Injection(format!("Failed to type newline: {}", err)))?;
            thread::sleep(Duration::from_millis(15));
        }

        let chars: Vec<char> = line.chars().collect();
        for chunk in chars.chunks(CHUNK_SIZE) {
            let chunk: String = chunk.iter().collect();
            keyboard
                .text(&chunk)
                .map_err(|err| SnipexError::Injection(format!("Failed to type text: {}", err)))?;
            if chars.len() > CHUNK_SIZE {
                thread::sleep(Duration::from_millis(20));
            }
        }

        thread::sleep(Duration::from_millis(10));
    }

    Ok(())
}

/// Save the clipboard, put `text` on it, run `paste`, then restore.
///
/// Every step goes through the same `clipboard` handle so the pasted text
/// is still being served when the paste keystroke lands.
fn paste_through<C: ClipboardHandle>(
    clipboard: &mut C,
    text: &str,
    config: &ExpansionConfig,
    paste: impl FnOnce() -> Result<()>,
) -> Result<()> {
    let previous = clipboard.text().ok();
    debug!(had_previous = previous.is_some(), "Saved clipboard");

    clipboard.set_text(text)?;
    thread::sleep(config.clipboard_settle());

    let paste_result = paste();

    thread::sleep(config.clipboard_restore_delay());
    if let Some(previous) = previous {
        if let Err(err) = clipboard.set_text(&previous) {
            warn!(error = %err, "Failed to restore clipboard");
        } else {
            debug!("Restored clipboard");
        }
    }

    paste_result
}

/// Injector backed by enigo key synthesis and the system clipboard
#[derive(Debug, Clone)]
pub struct SystemInjector {
    config: ExpansionConfig,
}

impl SystemInjector {
    pub fn new(config: ExpansionConfig) -> Self {
        Self { config }
    }

    /// Clipboard round trip: save, set, paste, restore.
    ///
    /// If something else writes the clipboard between our set and the
    /// restore, the paste may carry their text or the restore may overwrite
    /// it. Clipboard-as-transport cannot avoid that window; use
    /// `InjectionMethod::Typing` where it matters.
    fn paste_via_clipboard(&self, text: &str) -> Result<()> {
        let mut clipboard = open_clipboard()?;
        paste_through(&mut clipboard, text, &self.config, || self.send_paste())
    }

    fn send_paste(&self) -> Result<()> {
        let mut keyboard = create_keyboard_controller()?;
        let modifier = paste_modifier();

        keyboard
            .key(modifier, Direction::Press)
            .map_err(|err| SnipexError::Injection(format!("Failed to press modifier: {}", err)))?;
        let click = keyboard.key(Key::Unicode('v'), Direction::Click);
        // Always release the modifier, even if the click failed
        let release = keyboard.key(modifier, Direction::Release);

        click.map_err(|err| SnipexError::Injection(format!("Failed to send paste: {}", err)))?;
        release
            .map_err(|err| SnipexError::Injection(format!("Failed to release modifier: {}", err)))
    }
}

impl TextInjector for SystemInjector {
    fn delete_before_cursor(&self, count: usize) -> Result<()> {
        let mut keyboard = create_keyboard_controller()?;
        click_repeatedly(&mut keyboard, Key::Backspace, count, self.config.key_interval())
    }

    fn insert_text(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        match self.config.injection {
            InjectionMethod::Clipboard => self.paste_via_clipboard(text),
            InjectionMethod::Typing => {
                let mut keyboard = create_keyboard_controller()?;
                type_text_with_formatting(&mut keyboard, text)
            }
        }
    }

    fn move_cursor_left(&self, count: usize) -> Result<()> {
        let mut keyboard = create_keyboard_controller()?;
        click_repeatedly(
            &mut keyboard,
            Key::LeftArrow,
            count,
            self.config.cursor_step_delay(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_paste_modifier_matches_platform() {
        if cfg!(target_os = "macos") {
            assert_eq!(paste_modifier(), Key::Meta);
        } else {
            assert_eq!(paste_modifier(), Key::Control);
        }
    }

    /// In-memory clipboard sharing an operation log with the paste step
    struct LoggedClipboard<'a> {
        contents: Option<String>,
        log: &'a RefCell<Vec<String>>,
    }

    impl ClipboardHandle for LoggedClipboard<'_> {
        fn text(&mut self) -> Result<String> {
            self.log.borrow_mut().push("get".to_string());
            self.contents
                .clone()
                .ok_or_else(|| SnipexError::Clipboard("no text".to_string()))
        }

        fn set_text(&mut self, text: &str) -> Result<()> {
            self.log.borrow_mut().push(format!("set {}", text));
            self.contents = Some(text.to_string());
            Ok(())
        }
    }

    fn no_delays() -> ExpansionConfig {
        ExpansionConfig {
            clipboard_settle_ms: 0,
            clipboard_restore_delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_paste_happens_between_set_and_restore_on_one_handle() {
        let log = RefCell::new(Vec::new());
        let mut clipboard = LoggedClipboard {
            contents: Some("user data".to_string()),
            log: &log,
        };

        paste_through(&mut clipboard, "snippet", &no_delays(), || {
            log.borrow_mut().push("paste".to_string());
            Ok(())
        })
        .unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["get", "set snippet", "paste", "set user data"]
        );
        assert_eq!(clipboard.contents.as_deref(), Some("user data"));
    }

    #[test]
    fn test_failed_paste_without_previous_text_skips_restore() {
        let log = RefCell::new(Vec::new());
        let mut clipboard = LoggedClipboard {
            contents: None,
            log: &log,
        };

        let result = paste_through(&mut clipboard, "snippet", &no_delays(), || {
            log.borrow_mut().push("paste".to_string());
            Err(SnipexError::Injection("no event source".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(*log.borrow(), vec!["get", "set snippet", "paste"]);
    }

    #[test]
    fn test_empty_insert_is_noop() {
        // Must not touch the clipboard or the keyboard.
        let injector = SystemInjector::new(ExpansionConfig::default());
        assert!(injector.insert_text("").is_ok());
    }

    #[test]
    #[ignore = "Synthesizes real key presses"]
    fn test_system_injector_types_text() {
        let config = ExpansionConfig {
            injection: InjectionMethod::Typing,
            ..Default::default()
        };
        let injector = SystemInjector::new(config);
        injector.insert_text("snipex").unwrap();
        injector.delete_before_cursor(6).unwrap();
    }
}
