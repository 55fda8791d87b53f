use crate::error::{Result, SnipexError};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_DIRNAME: &str = ".snipex";
pub const CONFIG_FILENAME: &str = "config.json";
pub const SNIPPETS_FILENAME: &str = "snippets.json";

/// Most recent typed characters kept for trigger matching
pub const DEFAULT_BUFFER_CAPACITY: usize = 50;
pub const DEFAULT_TRIGGER_PREFIX: &str = "!";

/// Get the snipex configuration directory
pub fn get_config_dir() -> PathBuf {
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(CONFIG_DIRNAME))
        .unwrap_or_else(|_| PathBuf::from(CONFIG_DIRNAME))
}

/// Get the path to the engine configuration file
pub fn get_config_file_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILENAME)
}

/// Get the path to the snippet snapshot file
pub fn get_snippets_file_path() -> PathBuf {
    get_config_dir().join(SNIPPETS_FILENAME)
}

/// How expanded text reaches the foreground application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionMethod {
    /// Place the text on the clipboard, paste, then restore the clipboard
    #[default]
    Clipboard,
    /// Synthesize the text as keystrokes; leaves the clipboard untouched
    Typing,
}

/// Timing and capacity knobs for the expansion engine.
///
/// All delays are empirical. Applications differ in how quickly they consume
/// synthesized input, so every value here can be overridden in `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Pause before the first synthesized backspace
    pub pre_delete_delay_ms: u64,
    /// Pause after the last synthesized backspace
    pub post_delete_delay_ms: u64,
    /// Pause between individual synthesized backspaces
    pub key_interval_ms: u64,
    /// Pause after placing text on the clipboard, before pasting
    pub clipboard_settle_ms: u64,
    /// Pause after pasting before the previous clipboard text is restored
    pub clipboard_restore_delay_ms: u64,
    /// Pause between synthesized left-arrow presses
    pub cursor_step_delay_ms: u64,
    /// Pause after the last synthesized event before our own input stops
    /// being ignored, so events still queued in the OS are not buffered
    pub post_inject_settle_ms: u64,
    /// Pause between stop and start during a restart
    pub restart_settle_ms: u64,
    pub permission_poll_interval_ms: u64,
    /// How long hook installation waits for an early platform refusal
    pub hook_startup_timeout_ms: u64,
    /// Key events queued between the hook callback and the matcher
    pub event_queue_capacity: usize,
    pub buffer_capacity: usize,
    pub injection: InjectionMethod,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            pre_delete_delay_ms: 50,
            post_delete_delay_ms: 100,
            key_interval_ms: 2,
            clipboard_settle_ms: 10,
            clipboard_restore_delay_ms: 100,
            cursor_step_delay_ms: 1,
            post_inject_settle_ms: 50,
            restart_settle_ms: 100,
            permission_poll_interval_ms: 1000,
            hook_startup_timeout_ms: 250,
            event_queue_capacity: 256,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            injection: InjectionMethod::Clipboard,
        }
    }
}

impl ExpansionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.permission_poll_interval_ms == 0 {
            return Err(SnipexError::InvalidConfig(
                "permission_poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.event_queue_capacity == 0 {
            return Err(SnipexError::InvalidConfig(
                "event_queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(SnipexError::InvalidConfig(
                "buffer_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pre_delete_delay(&self) -> Duration {
        Duration::from_millis(self.pre_delete_delay_ms)
    }

    pub fn post_delete_delay(&self) -> Duration {
        Duration::from_millis(self.post_delete_delay_ms)
    }

    pub fn key_interval(&self) -> Duration {
        Duration::from_millis(self.key_interval_ms)
    }

    pub fn clipboard_settle(&self) -> Duration {
        Duration::from_millis(self.clipboard_settle_ms)
    }

    pub fn clipboard_restore_delay(&self) -> Duration {
        Duration::from_millis(self.clipboard_restore_delay_ms)
    }

    pub fn cursor_step_delay(&self) -> Duration {
        Duration::from_millis(self.cursor_step_delay_ms)
    }

    pub fn post_inject_settle(&self) -> Duration {
        Duration::from_millis(self.post_inject_settle_ms)
    }

    pub fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }

    pub fn permission_poll_interval(&self) -> Duration {
        Duration::from_millis(self.permission_poll_interval_ms)
    }

    pub fn hook_startup_timeout(&self) -> Duration {
        Duration::from_millis(self.hook_startup_timeout_ms)
    }
}

/// Load the engine configuration from the default location
pub fn load_config() -> Result<ExpansionConfig> {
    load_config_from(&get_config_file_path())
}

/// Load configuration from `path`, falling back to defaults when the file is absent
pub fn load_config_from(path: &Path) -> Result<ExpansionConfig> {
    if !path.exists() {
        return Ok(ExpansionConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(ExpansionConfig::default());
    }

    let config: ExpansionConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExpansionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_capacity, 50);
        assert_eq!(config.permission_poll_interval(), Duration::from_secs(1));
        assert_eq!(config.injection, InjectionMethod::Clipboard);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ExpansionConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pre_delete_delay_ms": 5, "injection": "typing"}}"#
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.pre_delete_delay_ms, 5);
        assert_eq!(config.injection, InjectionMethod::Typing);
        assert_eq!(config.post_delete_delay_ms, 100);
        assert_eq!(config.post_inject_settle(), Duration::from_millis(50));
        assert_eq!(config.buffer_capacity, 50);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"permission_poll_interval_ms": 0}}"#).unwrap();

        match load_config_from(file.path()) {
            Err(SnipexError::InvalidConfig(msg)) => {
                assert!(msg.contains("permission_poll_interval_ms"))
            }
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file_is_json_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            load_config_from(file.path()),
            Err(SnipexError::Json(_))
        ));
    }
}
