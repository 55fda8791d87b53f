//! Read-only access to the snippet snapshot file (`~/.snipex/snippets.json`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snipex_core::config::{get_snippets_file_path, DEFAULT_TRIGGER_PREFIX};
use snipex_core::{Result, Snippet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use uuid::Uuid;

/// A snippet record as written by the snippet manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredRecord")]
pub struct StoredSnippet {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(rename = "tagIDs")]
    pub tag_ids: Vec<Uuid>,
    pub trigger_prefix: String,
    pub trigger_sequence: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub is_favorite: bool,
    pub usage_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// On-disk shape, accepting both the current and the legacy trigger layout
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    id: Uuid,
    title: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, rename = "tagIDs")]
    tag_ids: Vec<Uuid>,
    trigger_prefix: Option<String>,
    trigger_sequence: Option<String>,
    trigger: Option<String>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    #[serde(default)]
    is_favorite: bool,
    #[serde(default)]
    usage_count: u64,
    last_used_at: Option<DateTime<Utc>>,
}

impl From<StoredRecord> for StoredSnippet {
    fn from(record: StoredRecord) -> Self {
        let (trigger_prefix, trigger_sequence) = match record.trigger {
            Some(legacy) => split_legacy_trigger(&legacy),
            None => (
                record
                    .trigger_prefix
                    .unwrap_or_else(|| DEFAULT_TRIGGER_PREFIX.to_string()),
                record.trigger_sequence.unwrap_or_default(),
            ),
        };

        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            tags: record.tags,
            tag_ids: record.tag_ids,
            trigger_prefix,
            trigger_sequence,
            created_at: record.created_at,
            modified_at: record.modified_at,
            is_favorite: record.is_favorite,
            usage_count: record.usage_count,
            last_used_at: record.last_used_at,
        }
    }
}

impl StoredSnippet {
    /// Prefix plus sequence; empty when no sequence is set
    pub fn trigger(&self) -> String {
        if self.trigger_sequence.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.trigger_prefix, self.trigger_sequence)
        }
    }

    pub fn to_engine_snippet(&self) -> Snippet {
        Snippet::from_parts(
            self.id,
            &self.trigger_prefix,
            &self.trigger_sequence,
            self.content.clone(),
        )
    }
}

/// Split a single-field legacy trigger into prefix and sequence
pub fn split_legacy_trigger(trigger: &str) -> (String, String) {
    let mut chars = trigger.chars();
    match chars.next() {
        None => (DEFAULT_TRIGGER_PREFIX.to_string(), String::new()),
        Some(first) if !first.is_alphanumeric() => (first.to_string(), chars.collect()),
        Some(_) => (DEFAULT_TRIGGER_PREFIX.to_string(), trigger.to_string()),
    }
}

/// Load snippets from the default snapshot file
pub fn load_snippets() -> Result<Vec<StoredSnippet>> {
    load_snippets_from(&get_snippets_file_path())
}

/// Load snippets from `path`. A missing or blank file is an empty snapshot.
pub fn load_snippets_from(path: &Path) -> Result<Vec<StoredSnippet>> {
    if !path.exists() {
        debug!(path = %path.display(), "Snippet file not found; using empty snapshot");
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(serde_json::from_str(&content)?)
}

/// Engine-facing snapshot of stored records, in file order
pub fn engine_snapshot(stored: &[StoredSnippet]) -> Vec<Snippet> {
    stored.iter().map(StoredSnippet::to_engine_snippet).collect()
}

/// Detects changes to the snapshot file by modification time
#[derive(Debug)]
pub struct SnapshotWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl SnapshotWatcher {
    /// Start watching `path`, treating its current state as already seen
    pub fn new(path: PathBuf) -> Self {
        let last_modified = modified_time(&path);
        Self {
            path,
            last_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file appeared, disappeared or was modified since the
    /// last call
    pub fn has_changed(&mut self) -> bool {
        let current = modified_time(&self.path);
        if current == self.last_modified {
            return false;
        }
        self.last_modified = current;
        true
    }

    /// Reload the snapshot; a broken file is logged and skipped
    pub fn reload(&self) -> Option<Vec<StoredSnippet>> {
        match load_snippets_from(&self.path) {
            Ok(snippets) => Some(snippets),
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "Failed to reload snippets");
                None
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CURRENT_RECORD: &str = r#"[
        {
            "id": "6F9619FF-8B86-D011-B42D-00CF4FC964FF",
            "title": "Address",
            "content": "123 Main St{{CURSOR}}, City",
            "tags": ["home"],
            "tagIDs": [],
            "triggerPrefix": "!",
            "triggerSequence": "addr",
            "createdAt": "2025-12-16T09:00:00Z",
            "modifiedAt": "2025-12-17T10:30:00Z",
            "isFavorite": true,
            "usageCount": 4,
            "lastUsedAt": "2025-12-18T14:30:45Z"
        }
    ]"#;

    const LEGACY_RECORDS: &str = r#"[
        {
            "id": "0E984725-C51C-4BF4-9960-E1C80E27ABA0",
            "title": "Colon",
            "content": "colon",
            "tags": [],
            "trigger": ";sig",
            "createdAt": "2025-12-16T09:00:00Z",
            "modifiedAt": "2025-12-16T09:00:00Z"
        },
        {
            "id": "1A2B3C4D-0000-4000-8000-000000000001",
            "title": "Bare",
            "content": "bare",
            "tags": [],
            "trigger": "brb",
            "createdAt": "2025-12-16T09:00:00Z",
            "modifiedAt": "2025-12-16T09:00:00Z"
        },
        {
            "id": "1A2B3C4D-0000-4000-8000-000000000002",
            "title": "Empty",
            "content": "empty",
            "tags": [],
            "trigger": "",
            "createdAt": "2025-12-16T09:00:00Z",
            "modifiedAt": "2025-12-16T09:00:00Z"
        }
    ]"#;

    fn write_snippets(dir: &TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("snippets.json");
        fs::write(&path, json).unwrap();
        path
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    #[test]
    fn test_current_record_parses() {
        let dir = TempDir::new().unwrap();
        let path = write_snippets(&dir, CURRENT_RECORD);

        let snippets = load_snippets_from(&path).unwrap();

        assert_eq!(snippets.len(), 1);
        let snippet = &snippets[0];
        assert_eq!(snippet.title, "Address");
        assert_eq!(snippet.trigger(), "!addr");
        assert!(snippet.is_favorite);
        assert_eq!(snippet.usage_count, 4);
        assert!(snippet.last_used_at.is_some());
    }

    #[test]
    fn test_legacy_triggers_are_split() {
        let dir = TempDir::new().unwrap();
        let path = write_snippets(&dir, LEGACY_RECORDS);

        let snippets = load_snippets_from(&path).unwrap();
        let parts: Vec<(&str, &str)> = snippets
            .iter()
            .map(|s| (s.trigger_prefix.as_str(), s.trigger_sequence.as_str()))
            .collect();

        assert_eq!(parts, vec![(";", "sig"), ("!", "brb"), ("!", "")]);
        assert_eq!(snippets[2].trigger(), "");
        // Defaults for fields older files lack
        assert!(!snippets[0].is_favorite);
        assert_eq!(snippets[0].usage_count, 0);
    }

    #[test]
    fn test_split_legacy_trigger() {
        assert_eq!(split_legacy_trigger(""), ("!".to_string(), String::new()));
        assert_eq!(
            split_legacy_trigger(":date"),
            (":".to_string(), "date".to_string())
        );
        assert_eq!(
            split_legacy_trigger("addr"),
            ("!".to_string(), "addr".to_string())
        );
        assert_eq!(
            split_legacy_trigger("9am"),
            ("!".to_string(), "9am".to_string())
        );
    }

    #[test]
    fn test_missing_and_blank_files_are_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_snippets_from(&dir.path().join("absent.json"))
            .unwrap()
            .is_empty());

        let path = write_snippets(&dir, "  \n");
        assert!(load_snippets_from(&path).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_snippets(&dir, "{ not json");
        assert!(load_snippets_from(&path).is_err());
    }

    #[test]
    fn test_engine_snapshot_keeps_order_and_ids() {
        let dir = TempDir::new().unwrap();
        let path = write_snippets(&dir, LEGACY_RECORDS);
        let stored = load_snippets_from(&path).unwrap();

        let snapshot = engine_snapshot(&stored);

        let triggers: Vec<&str> = snapshot.iter().map(|s| s.trigger.as_str()).collect();
        assert_eq!(triggers, vec![";sig", "!brb", ""]);
        assert_eq!(snapshot[0].id, stored[0].id);
    }

    #[test]
    fn test_serialized_record_uses_current_layout() {
        let dir = TempDir::new().unwrap();
        let path = write_snippets(&dir, LEGACY_RECORDS);
        let stored = load_snippets_from(&path).unwrap();

        let json = serde_json::to_value(&stored[0]).unwrap();

        assert_eq!(json["triggerPrefix"], ";");
        assert_eq!(json["triggerSequence"], "sig");
        assert!(json.get("trigger").is_none());
        assert!(json.get("lastUsedAt").is_none());
    }

    // ========================================================================
    // Watching
    // ========================================================================

    #[test]
    fn test_watcher_notices_new_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snippets.json");
        let mut watcher = SnapshotWatcher::new(path.clone());

        assert!(!watcher.has_changed());

        fs::write(&path, CURRENT_RECORD).unwrap();
        assert!(watcher.has_changed());
        assert!(!watcher.has_changed());
        assert_eq!(watcher.reload().unwrap().len(), 1);
    }

    #[test]
    fn test_watcher_reload_skips_broken_file() {
        let dir = TempDir::new().unwrap();
        let path = write_snippets(&dir, "[");
        let watcher = SnapshotWatcher::new(path);

        assert!(watcher.reload().is_none());
    }
}
