use crate::config::ExpansionConfig;
use crate::injection::TextInjector;
use crate::matcher::ExpansionRequest;
use crate::state::EngineState;
use crate::variables::{extract_cursor, resolve_with, VariableSource};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, instrument, warn};

/// What an expansion actually sent to the foreground application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionOutcome {
    pub deleted: usize,
    pub inserted: String,
    /// Left-arrow presses used to reach the cursor marker
    pub cursor_back: Option<usize>,
}

/// Lifts suppression when dropped, so a panicking step cannot leave it stuck
struct SuppressionRelease<'a> {
    state: &'a EngineState,
    session: u64,
}

impl Drop for SuppressionRelease<'_> {
    fn drop(&mut self) {
        if !self.state.finish_expansion(self.session) {
            debug!(
                session = self.session,
                "Monitoring session ended during expansion; suppression already reset"
            );
        }
    }
}

/// Replaces a typed trigger with its resolved snippet text.
///
/// Runs on a worker thread: every step may sleep, and none of them may run
/// inside the keyboard hook callback.
pub struct Executor {
    config: ExpansionConfig,
    state: Arc<EngineState>,
    injector: Arc<dyn TextInjector>,
    variables: Arc<dyn VariableSource>,
}

impl Executor {
    pub fn new(
        config: ExpansionConfig,
        state: Arc<EngineState>,
        injector: Arc<dyn TextInjector>,
        variables: Arc<dyn VariableSource>,
    ) -> Self {
        Self {
            config,
            state,
            injector,
            variables,
        }
    }

    /// Perform the expansion. Failing steps are logged and skipped; the
    /// suppression flag is always released at the end.
    #[instrument(skip_all, fields(trigger = %request.snippet.trigger))]
    pub fn execute(&self, request: &ExpansionRequest) -> ExpansionOutcome {
        let _release = SuppressionRelease {
            state: &self.state,
            session: request.session,
        };

        if request.trigger_len > 0 {
            thread::sleep(self.config.pre_delete_delay());
            if let Err(e) = self.injector.delete_before_cursor(request.trigger_len) {
                warn!(error = %e, chars = request.trigger_len, "Failed to delete trigger");
            }
            thread::sleep(self.config.post_delete_delay());
        }

        let resolved = resolve_with(&request.snippet.content, self.variables.as_ref());
        let (text, cursor_offset) = extract_cursor(&resolved);

        if let Err(e) = self.injector.insert_text(&text) {
            warn!(error = %e, "Failed to insert expansion text");
        }

        let cursor_back = cursor_offset.map(|offset| text.chars().count() - offset);
        if let Some(back) = cursor_back.filter(|back| *back > 0) {
            if let Err(e) = self.injector.move_cursor_left(back) {
                warn!(error = %e, steps = back, "Failed to reposition cursor");
            }
        }

        // Synthesized events may still be queued in the OS; keep ignoring them
        thread::sleep(self.config.post_inject_settle());

        info!(
            deleted = request.trigger_len,
            inserted_len = text.len(),
            cursor_back = ?cursor_back,
            "Expansion completed"
        );

        ExpansionOutcome {
            deleted: request.trigger_len,
            inserted: text,
            cursor_back,
        }
    }
}
