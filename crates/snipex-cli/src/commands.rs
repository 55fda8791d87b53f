use crate::cli::Commands;
use crate::store::{engine_snapshot, load_snippets_from, SnapshotWatcher, StoredSnippet};
use snipex_core::config::get_snippets_file_path;
use snipex_core::{extract_cursor, load_config, resolve, Result, TriggerIndex};
use snipex_daemon::{ExpansionMonitor, MonitorStatus, PermissionProbe, SystemPermissions};
use std::path::PathBuf;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;
use tracing::{info, warn};

/// How often `run` looks at the snippet file for changes
const SNIPPET_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run { snippets } => run_monitor(snippets),
        Commands::Resolve { text } => {
            println!("{}", resolve_for_display(&text));
            Ok(())
        }
        Commands::List { snippets } => list_snippets(snippets),
        Commands::Permission { request } => handle_permission(request),
        Commands::Config => print_config(),
    }
}

fn run_monitor(snippets: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let mut watcher = SnapshotWatcher::new(snippets.unwrap_or_else(get_snippets_file_path));
    let stored = load_snippets_from(watcher.path())?;

    let monitor = ExpansionMonitor::new_with_snippets(config, engine_snapshot(&stored));
    let updates = monitor.subscribe();

    if !monitor.is_enabled() {
        monitor.start();
    }
    log_status(monitor.status());

    info!(path = %watcher.path().display(), "Watching snippet file; press Ctrl+C to quit");

    loop {
        match updates.recv_timeout(SNIPPET_POLL_INTERVAL) {
            Ok(status) => log_status(status),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if watcher.has_changed() {
            if let Some(stored) = watcher.reload() {
                monitor.update_snippets(engine_snapshot(&stored));
            }
        }
    }

    Ok(())
}

fn log_status(status: MonitorStatus) {
    match (status.enabled, status.has_permission) {
        (true, _) => info!("Expansion active"),
        (false, true) => warn!("Expansion inactive"),
        (false, false) => {
            warn!("Expansion inactive: grant input-monitoring permission to this terminal")
        }
    }
}

/// Resolved text, followed by the cursor position when a marker was present
fn resolve_for_display(text: &str) -> String {
    let (resolved, cursor) = extract_cursor(&resolve(text));
    match cursor {
        Some(offset) => format!("{}\n(cursor at character {})", resolved, offset),
        None => resolved,
    }
}

fn list_snippets(snippets: Option<PathBuf>) -> Result<()> {
    let path = snippets.unwrap_or_else(get_snippets_file_path);
    let stored = load_snippets_from(&path)?;

    if stored.is_empty() {
        println!("No snippets found in {}", path.display());
        return Ok(());
    }

    for line in format_listing(&stored) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per stored snippet; entries the engine will not register say why
fn format_listing(stored: &[StoredSnippet]) -> Vec<String> {
    let index = TriggerIndex::build(engine_snapshot(stored));

    stored
        .iter()
        .map(|snippet| {
            let trigger = snippet.trigger();
            let note = if trigger.is_empty() {
                " (no trigger)"
            } else if index.get(&trigger).map(|s| s.id) != Some(snippet.id) {
                " (shadowed by an earlier snippet)"
            } else {
                ""
            };
            format!("{:<16} {}{}", trigger, snippet.title, note)
        })
        .collect()
}

fn handle_permission(request: bool) -> Result<()> {
    let permissions = SystemPermissions;

    if permissions.is_granted() {
        println!("Input-monitoring permission: granted");
        return Ok(());
    }

    println!("Input-monitoring permission: not granted");
    if request {
        permissions.request();
    } else {
        println!("Run `snipex permission --request` to open the request flow");
    }
    Ok(())
}

fn print_config() -> Result<()> {
    let config = load_config()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn stored(title: &str, prefix: &str, sequence: &str) -> StoredSnippet {
        StoredSnippet {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: format!("{} content", title),
            tags: Vec::new(),
            tag_ids: Vec::new(),
            trigger_prefix: prefix.to_string(),
            trigger_sequence: sequence.to_string(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
            is_favorite: false,
            usage_count: 0,
            last_used_at: None,
        }
    }

    #[test]
    fn test_resolve_for_display_reports_cursor() {
        assert_eq!(resolve_for_display("A{{CURSOR}}B"), "AB\n(cursor at character 1)");
        assert_eq!(resolve_for_display("plain"), "plain");
    }

    #[test]
    fn test_listing_marks_unregistered_entries() {
        let listing = format_listing(&[
            stored("Address", "!", "addr"),
            stored("Draft", "!", ""),
            stored("Address copy", "!", "addr"),
        ]);

        assert_eq!(listing.len(), 3);
        assert!(listing[0].starts_with("!addr"));
        assert!(listing[0].ends_with("Address"));
        assert!(listing[1].ends_with("(no trigger)"));
        assert!(listing[2].ends_with("(shadowed by an earlier snippet)"));
    }
}
