//! Notes, activities and the audit log.

use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::error::Result;
use crate::model::{Activity, LogAction, LogEntry, Note};

use super::{
    decode_error, enum_column, format_timestamp, optional_enum_column, timestamp_column, Storage,
};

const NOTE_COLUMNS: &str = "n.id, n.content, n.lead_id, n.user_id, n.created_at";
const ACTIVITY_COLUMNS: &str = "a.id, a.title, a.description, a.lead_id, a.user_id, a.due_date, a.completed, a.activity_type, a.created_at";
const LOG_COLUMNS: &str = "id, user_id, action, details, entity_id, entity_type, created_at";

impl Storage {
    // === Notes ===

    /// Insert a note.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_note(&self, note: &Note) -> Result<()> {
        self.conn.execute(
            "INSERT INTO notes (id, content, lead_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                note.id,
                note.content,
                note.lead_id,
                note.user_id,
                format_timestamp(&note.created_at),
            ],
        )?;
        debug!("Inserted note {} on lead {}", note.id, note.lead_id);
        Ok(())
    }

    /// List the notes on a company's leads, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_notes(&self, company_id: &str) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            r"
            SELECT {NOTE_COLUMNS} FROM notes n
            JOIN leads l ON l.id = n.lead_id
            WHERE l.company_id = ?1
            ORDER BY n.created_at DESC
            "
        ))?;
        let notes = stmt
            .query_map([company_id], row_to_note)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_error("notes"))?;
        Ok(notes)
    }

    // === Activities ===

    /// Insert an activity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_activity(&self, activity: &Activity) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO activities
                (id, title, description, lead_id, user_id, due_date, completed, activity_type, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                activity.id,
                activity.title,
                activity.description,
                activity.lead_id,
                activity.user_id,
                format_timestamp(&activity.due_date),
                activity.completed,
                activity.activity_type.as_str(),
                format_timestamp(&activity.created_at),
            ],
        )?;
        debug!(
            "Inserted activity {} on lead {}",
            activity.id, activity.lead_id
        );
        Ok(())
    }

    /// Get an activity by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_activity(&self, id: &str) -> Result<Option<Activity>> {
        self.conn
            .query_row(
                &format!("SELECT {ACTIVITY_COLUMNS} FROM activities a WHERE a.id = ?1"),
                [id],
                row_to_activity,
            )
            .optional()
            .map_err(decode_error("activities"))
    }

    /// List the activities on a company's leads by due date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_activities(&self, company_id: &str) -> Result<Vec<Activity>> {
        let mut stmt = self.conn.prepare(&format!(
            r"
            SELECT {ACTIVITY_COLUMNS} FROM activities a
            JOIN leads l ON l.id = a.lead_id
            WHERE l.company_id = ?1
            ORDER BY a.due_date ASC
            "
        ))?;
        let activities = stmt
            .query_map([company_id], row_to_activity)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_error("activities"))?;
        Ok(activities)
    }

    /// Overwrite an activity's editable fields.
    ///
    /// Returns `true` if the activity exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_activity(&self, activity: &Activity) -> Result<bool> {
        let affected = self.conn.execute(
            r"
            UPDATE activities SET title = ?2, description = ?3, lead_id = ?4,
                due_date = ?5, completed = ?6, activity_type = ?7
            WHERE id = ?1
            ",
            params![
                activity.id,
                activity.title,
                activity.description,
                activity.lead_id,
                format_timestamp(&activity.due_date),
                activity.completed,
                activity.activity_type.as_str(),
            ],
        )?;
        Ok(affected > 0)
    }

    /// Delete an activity.
    ///
    /// Returns `true` if an activity was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_activity(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM activities WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    // === Audit log ===

    /// Append an entry to a company's audit log.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_log(&self, company_id: &str, entry: &LogEntry) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO logs (id, company_id, user_id, action, details, entity_id, entity_type, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                entry.id,
                company_id,
                entry.user_id,
                entry.action.as_str(),
                entry.details,
                entry.entity_id,
                entry.entity_type.map(|t| t.as_str()),
                format_timestamp(&entry.created_at),
            ],
        )?;
        Ok(())
    }

    /// List a company's audit log, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_logs(&self, company_id: &str) -> Result<Vec<LogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM logs WHERE company_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))?;
        let entries = stmt
            .query_map([company_id], row_to_log)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_error("logs"))?;
        Ok(entries)
    }
}

fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        content: row.get(1)?,
        lead_id: row.get(2)?,
        user_id: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
    })
}

fn row_to_activity(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        lead_id: row.get(3)?,
        user_id: row.get(4)?,
        due_date: timestamp_column(row, 5)?,
        completed: row.get(6)?,
        activity_type: enum_column(row, 7)?,
        created_at: timestamp_column(row, 8)?,
    })
}

fn row_to_log(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    let action: String = row.get(2)?;
    Ok(LogEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        action: LogAction::from(action.as_str()),
        details: row.get(3)?,
        entity_id: row.get(4)?,
        entity_type: optional_enum_column(row, 5)?,
        created_at: timestamp_column(row, 6)?,
    })
}
