//! snipex core - trigger recognition and text expansion.
//!
//! Key events are reduced to [`KeyInput`], fed through a [`Matcher`] that
//! keeps a short window of typed text, and matched triggers are handed to an
//! [`Executor`] which erases the trigger and injects the resolved snippet.

pub mod buffer;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod executor;
pub mod index;
pub mod injection;
pub mod keyboard;
pub mod matcher;
pub mod models;
pub mod state;
pub mod variables;

// Re-export common items for convenience
pub use config::{get_config_dir, load_config, ExpansionConfig, InjectionMethod};
pub use error::{Result, SnipexError};
pub use executor::{ExpansionOutcome, Executor};
pub use index::TriggerIndex;
pub use injection::{SystemInjector, TextInjector};
pub use keyboard::{KeyInput, KeyTranslator, ResetKey};
pub use matcher::{ExpansionRequest, Matcher};
pub use models::Snippet;
pub use state::EngineState;
pub use variables::{extract_cursor, resolve, resolve_with, SystemVariables, VariableSource};
