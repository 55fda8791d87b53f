//! State shared between the hook callback, the matcher and expansion workers.
//!
//! Every accessor takes its lock for a single read or write. Nothing here is
//! held across the slow expansion sequence; the suppression flag is what keeps
//! synthesized keystrokes out of the buffer while an expansion runs.

use crate::buffer::TypedBuffer;
use crate::index::TriggerIndex;
use crate::models::Snippet;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sentinel stored in `suppressed_by` when no expansion is running
const NOT_SUPPRESSED: u64 = 0;

#[derive(Debug)]
pub struct EngineState {
    buffer: Mutex<TypedBuffer>,
    index: RwLock<Arc<TriggerIndex>>,
    /// Monitoring session counter, bumped on every reset
    session: AtomicU64,
    /// Session id of the running expansion, or `NOT_SUPPRESSED`
    suppressed_by: AtomicU64,
}

impl EngineState {
    pub fn new(buffer_capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(TypedBuffer::new(buffer_capacity)),
            index: RwLock::new(Arc::new(TriggerIndex::default())),
            session: AtomicU64::new(1),
            suppressed_by: AtomicU64::new(NOT_SUPPRESSED),
        }
    }

    // ------------------------------------------------------------------
    // Trigger index
    // ------------------------------------------------------------------

    /// Swap in a freshly built index; in-flight scans keep the old one
    pub fn replace_snippets(&self, snapshot: Vec<Snippet>) -> usize {
        let index = Arc::new(TriggerIndex::build(snapshot));
        let count = index.len();
        *self.index.write() = index;
        count
    }

    pub fn index(&self) -> Arc<TriggerIndex> {
        self.index.read().clone()
    }

    // ------------------------------------------------------------------
    // Typed buffer
    // ------------------------------------------------------------------

    pub fn push_typed(&self, text: &str) -> String {
        let mut buffer = self.buffer.lock();
        buffer.push_str(text);
        buffer.contents()
    }

    pub fn pop_typed(&self) -> Option<char> {
        self.buffer.lock().pop()
    }

    pub fn clear_typed(&self) {
        self.buffer.lock().clear();
    }

    pub fn typed(&self) -> String {
        self.buffer.lock().contents()
    }

    // ------------------------------------------------------------------
    // Suppression and sessions
    // ------------------------------------------------------------------

    pub fn current_session(&self) -> u64 {
        self.session.load(Ordering::SeqCst)
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed_by.load(Ordering::SeqCst) != NOT_SUPPRESSED
    }

    /// Mark an expansion as running for the current session and return that session
    pub fn begin_expansion(&self) -> u64 {
        let session = self.current_session();
        self.suppressed_by.store(session, Ordering::SeqCst);
        session
    }

    /// Lift suppression, but only if `session` still owns it.
    ///
    /// Returns false when monitoring was stopped (or restarted) while the
    /// expansion was running; the newer session's flag is left alone.
    pub fn finish_expansion(&self, session: u64) -> bool {
        self.suppressed_by
            .compare_exchange(session, NOT_SUPPRESSED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// End the current monitoring session: empty buffer, no suppression
    pub fn reset_session(&self) {
        self.session.fetch_add(1, Ordering::SeqCst);
        self.suppressed_by.store(NOT_SUPPRESSED, Ordering::SeqCst);
        self.clear_typed();
    }
}
