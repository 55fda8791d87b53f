use crate::models::Snippet;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Read-only lookup from trigger text to snippet, built from one snapshot.
///
/// Entries keep snapshot order. Matching walks that order and stops at the
/// first trigger the buffer ends with, so `"!a"` registered before `"!ba"`
/// fires on `"…!ba"` even though `"!ba"` is longer.
#[derive(Debug, Default)]
pub struct TriggerIndex {
    entries: Vec<Arc<Snippet>>,
}

impl TriggerIndex {
    /// Build an index, skipping empty triggers and repeats of a trigger already seen
    pub fn build(snapshot: Vec<Snippet>) -> Self {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(snapshot.len());

        for snippet in snapshot {
            if snippet.trigger.is_empty() {
                continue;
            }
            if !seen.insert(snippet.trigger.clone()) {
                debug!(trigger = %snippet.trigger, "Duplicate trigger ignored");
                continue;
            }
            entries.push(Arc::new(snippet));
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, trigger: &str) -> Option<&Arc<Snippet>> {
        self.entries.iter().find(|s| s.trigger == trigger)
    }

    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.trigger.as_str())
    }

    /// First snippet, in snapshot order, whose trigger is a suffix of `typed`
    pub fn find_suffix_match(&self, typed: &str) -> Option<&Arc<Snippet>> {
        self.entries.iter().find(|s| typed.ends_with(s.trigger.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_skips_empty_triggers() {
        let index = TriggerIndex::build(vec![
            Snippet::new("", "never"),
            Snippet::new("!sig", "Best regards"),
        ]);
        assert_eq!(index.len(), 1);
        assert!(index.get("!sig").is_some());
    }

    #[test]
    fn test_build_keeps_first_of_duplicate_triggers() {
        let index = TriggerIndex::build(vec![
            Snippet::new("!x", "first"),
            Snippet::new("!x", "second"),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("!x").unwrap().content, "first");
    }

    #[test]
    fn test_suffix_match() {
        let index = TriggerIndex::build(vec![Snippet::new("!addr", "123 Main St")]);
        assert!(index.find_suffix_match("hello !addr").is_some());
        assert!(index.find_suffix_match("!addr ").is_none());
        assert!(index.find_suffix_match("!add").is_none());
    }

    #[test]
    fn test_first_registered_match_wins_over_longer() {
        let index = TriggerIndex::build(vec![
            Snippet::new("!a", "short"),
            Snippet::new("!ba", "long"),
        ]);
        // Only "!ba" is a suffix of "x!ba"; "!a" is not.
        assert_eq!(index.find_suffix_match("x!ba").unwrap().trigger, "!ba");

        let index = TriggerIndex::build(vec![
            Snippet::new("a", "short"),
            Snippet::new("!ba", "long"),
        ]);
        // Both are suffixes; snapshot order decides.
        assert_eq!(index.find_suffix_match("!ba").unwrap().content, "short");
    }

    #[test]
    fn test_triggers_preserve_snapshot_order() {
        let index = TriggerIndex::build(vec![
            Snippet::new("!b", "B"),
            Snippet::new("!a", "A"),
        ]);
        let triggers: Vec<_> = index.triggers().collect();
        assert_eq!(triggers, vec!["!b", "!a"]);
    }
}
