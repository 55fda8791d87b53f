use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A trigger/content pair handed to the engine by the snippet store.
///
/// The engine never mutates a snippet; a fresh snapshot replaces the old one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: Uuid,
    pub trigger: String,
    pub content: String,
}

impl Snippet {
    pub fn new(trigger: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger: trigger.into(),
            content: content.into(),
        }
    }

    /// Build a snippet whose trigger is `prefix` followed by `sequence`.
    ///
    /// An empty sequence yields an empty trigger, which the index ignores.
    pub fn from_parts(id: Uuid, prefix: &str, sequence: &str, content: impl Into<String>) -> Self {
        let trigger = if sequence.is_empty() {
            String::new()
        } else {
            format!("{}{}", prefix, sequence)
        };

        Self {
            id,
            trigger,
            content: content.into(),
        }
    }

    /// Number of characters the user typed to fire this snippet
    pub fn trigger_len(&self) -> usize {
        self.trigger.chars().count()
    }
}
