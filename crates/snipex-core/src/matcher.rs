use crate::keyboard::KeyInput;
use crate::models::Snippet;
use crate::state::EngineState;
use std::sync::Arc;
use tracing::{debug, trace};

/// A matched trigger, ready to hand to the executor
#[derive(Debug, Clone)]
pub struct ExpansionRequest {
    pub snippet: Arc<Snippet>,
    /// Characters to erase in the foreground application
    pub trigger_len: usize,
    /// Monitoring session that owns the suppression flag for this expansion
    pub session: u64,
}

/// Feeds key events into the typed buffer and scans for triggers.
///
/// Cheap to call for every key-down: each step takes one short lock and the
/// index scan runs on a snapshot `Arc` without holding any lock.
#[derive(Debug, Clone)]
pub struct Matcher {
    state: Arc<EngineState>,
}

impl Matcher {
    pub fn new(state: Arc<EngineState>) -> Self {
        Self { state }
    }

    pub fn process(&self, input: &KeyInput) -> Option<ExpansionRequest> {
        // Our own synthesized keystrokes arrive while suppressed.
        if self.state.is_suppressed() {
            trace!("Key ignored while expansion is running");
            return None;
        }

        let typed = match input {
            KeyInput::Reset(_) => {
                self.state.clear_typed();
                return None;
            }
            KeyInput::Backspace => {
                self.state.pop_typed();
                return None;
            }
            KeyInput::Other => return None,
            KeyInput::Character(text) => self.state.push_typed(text),
        };

        let index = self.state.index();
        let snippet = index.find_suffix_match(&typed)?;

        self.state.clear_typed();
        let session = self.state.begin_expansion();

        debug!(
            trigger = %snippet.trigger,
            session,
            "Trigger matched"
        );

        Some(ExpansionRequest {
            trigger_len: snippet.trigger_len(),
            snippet: Arc::clone(snippet),
            session,
        })
    }
}
