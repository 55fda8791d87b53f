use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnipexError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Synthetic keyboard input could not be created or posted
    #[error("Input synthesis error: {0}")]
    Injection(String),

    /// The platform refused to install the keyboard hook
    #[error("Keyboard hook error: {0}")]
    Hook(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SnipexError>;
