//! Audit log view.

use std::collections::HashSet;

use serde::Serialize;

use crate::kanban::Snapshot;
use crate::model::LogEntry;

/// Filter value that selects every user.
pub const ALL_USERS: &str = "all";

/// Log entries newest first, restricted to one user when `user_id` is set.
/// `None`, a blank id and [`ALL_USERS`] all mean "everyone".
#[must_use]
pub fn filter_logs<'a>(logs: &'a [LogEntry], user_id: Option<&str>) -> Vec<&'a LogEntry> {
    let user_id = user_id
        .map(str::trim)
        .filter(|id| !id.is_empty() && *id != ALL_USERS);

    let mut entries: Vec<&LogEntry> = logs
        .iter()
        .filter(|e| user_id.map_or(true, |id| e.user_id == id))
        .collect();
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries
}

/// Distinct users that appear in the log, in order of first appearance.
#[must_use]
pub fn log_users(logs: &[LogEntry]) -> Vec<&str> {
    let mut seen = HashSet::new();
    logs.iter()
        .map(|e| e.user_id.as_str())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// A log entry ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRow<'a> {
    /// The entry.
    pub entry: &'a LogEntry,
    /// Name of the acting user, or their id when unknown.
    pub user: &'a str,
    /// Human-readable action.
    pub action: &'a str,
    /// `type (id)` of the affected record, when recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

/// Display rows for the log page.
#[must_use]
pub fn log_rows<'a>(snapshot: &'a Snapshot, user_id: Option<&str>) -> Vec<LogRow<'a>> {
    filter_logs(&snapshot.logs, user_id)
        .into_iter()
        .map(|entry| LogRow {
            entry,
            user: snapshot.user_name(&entry.user_id),
            action: entry.action.label(),
            entity: entry.entity_type.map(|ty| match &entry.entity_id {
                Some(id) => format!("{ty} ({id})"),
                None => ty.to_string(),
            }),
        })
        .collect()
}
