//! The log command: audit history, newest first.

use roster_core::audit::LogEntry;

use crate::cli::util::{CliApp, format_time, report_error};

/// Handle the log command.
pub fn handle_log(app: &CliApp, player: Option<&str>, limit: Option<usize>) -> bool {
    let entries = match app.audit_log() {
        Ok(entries) => entries,
        Err(e) => {
            report_error(&e);
            return false;
        }
    };

    let selected = select(entries, player, limit);
    if selected.is_empty() {
        println!("No log entries.");
        return true;
    }

    for entry in &selected {
        let action = entry.action.map(|a| a.as_str()).unwrap_or("?");
        println!(
            "{}  {}  {} {}",
            format_time(entry.timestamp),
            entry.email,
            action,
            entry.player_name
        );
        println!("    {}", entry.changes);
    }
    true
}

/// Keep entries for `player` (case-insensitive), at most `limit` of them.
fn select(entries: Vec<LogEntry>, player: Option<&str>, limit: Option<usize>) -> Vec<LogEntry> {
    entries
        .into_iter()
        .filter(|e| player.is_none_or(|p| e.player_name.eq_ignore_ascii_case(p.trim())))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::changes::ChangeSet;

    fn entry(player: &str) -> LogEntry {
        LogEntry {
            user_id: "uid".into(),
            email: "op@example.com".into(),
            action: None,
            player_name: player.into(),
            timestamp: None,
            changes: ChangeSet::Created,
        }
    }

    #[test]
    fn test_select_filters_by_player_and_limits() {
        let entries = vec![entry("Thorne"), entry("Mira"), entry("thorne"), entry("Thorne")];

        assert_eq!(select(entries.clone(), Some("THORNE"), None).len(), 3);
        assert_eq!(select(entries.clone(), Some("Thorne"), Some(2)).len(), 2);
        assert_eq!(select(entries, None, Some(1))[0].player_name, "Thorne");
    }
}
