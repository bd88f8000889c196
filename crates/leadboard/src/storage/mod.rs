//! Storage layer for leadboard.
//!
//! This module provides the `SQLite` table store behind the pipeline: plain
//! insert, get, list, update and delete per record type, with no business
//! rules of its own. The per-table queries live in the submodules.

mod accounts;
pub mod migrations;
mod pipeline;
mod records;
pub mod schema;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Metadata key holding the acting user of the workspace.
const CURRENT_USER_KEY: &str = "current_user_id";

/// Metadata key holding the company whose pipeline is worked on.
const CURRENT_COMPANY_KEY: &str = "current_company_id";

/// Storage engine for pipeline records.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Generated `<prefix>-<hex>` identifiers
/// - One table per record type
/// - A key/value metadata table for the active workspace
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// The company and user a database is worked as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
    /// Company whose pipeline is loaded.
    pub company_id: String,
    /// User recorded as the actor of every change.
    pub user_id: String,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Generate a fresh identifier such as `led-3fa81c02`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn generate_id(&self, prefix: &str) -> Result<String> {
        let id: String = self.conn.query_row(
            "SELECT ?1 || '-' || lower(hex(randomblob(4)))",
            [prefix],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Read a metadata value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write a metadata value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            (key, value),
        )?;
        Ok(())
    }

    /// The active workspace, if one has been set up.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn workspace(&self) -> Result<Option<Workspace>> {
        let company_id = self.get_meta(CURRENT_COMPANY_KEY)?;
        let user_id = self.get_meta(CURRENT_USER_KEY)?;
        Ok(company_id
            .zip(user_id)
            .map(|(company_id, user_id)| Workspace {
                company_id,
                user_id,
            }))
    }

    /// Record the active workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_workspace(&self, workspace: &Workspace) -> Result<()> {
        self.set_meta(CURRENT_COMPANY_KEY, &workspace.company_id)?;
        self.set_meta(CURRENT_USER_KEY, &workspace.user_id)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            companies: self.count_rows("companies")?,
            users: self.count_rows("users")?,
            stages: self.count_rows("stages")?,
            interests: self.count_rows("interests")?,
            leads: self.count_rows("leads")?,
            notes: self.count_rows("notes")?,
            activities: self.count_rows("activities")?,
            logs: self.count_rows("logs")?,
            db_size_bytes,
        })
    }

    fn count_rows(&self, table: &'static str) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Number of companies.
    pub companies: i64,
    /// Number of users.
    pub users: i64,
    /// Number of stages.
    pub stages: i64,
    /// Number of interests.
    pub interests: i64,
    /// Number of leads.
    pub leads: i64,
    /// Number of notes.
    pub notes: i64,
    /// Number of activities.
    pub activities: i64,
    /// Number of audit log entries.
    pub logs: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// Current time at the precision timestamps are stored with.
///
/// Records built from this value compare equal to what is read back.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Stored text form of a timestamp.
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Read a timestamp column.
pub(crate) fn timestamp_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read an enum column stored in its string form.
pub(crate) fn enum_column<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = Error>,
{
    let text: String = row.get(idx)?;
    text.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.to_string().into())
    })
}

/// Read an optional enum column.
pub(crate) fn optional_enum_column<T>(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = Error>,
{
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        t.parse().map_err(|e: Error| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.to_string().into())
        })
    })
    .transpose()
}

/// Map a decoding failure onto the table it came from.
pub(crate) fn decode_error(table: &'static str) -> impl Fn(rusqlite::Error) -> Error {
    move |e| match e {
        rusqlite::Error::FromSqlConversionFailure(..) => Error::corrupt_row(table, e.to_string()),
        other => Error::DatabaseQuery(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_open_in_memory() {
        let storage = Storage::open_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_generate_id_format() {
        let storage = create_test_storage();
        let id = storage.generate_id("led").unwrap();

        assert!(id.starts_with("led-"));
        let hex = &id[4..];
        assert_eq!(hex.len(), 8);
        assert!(hex
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_generate_id_is_unique() {
        let storage = create_test_storage();
        let a = storage.generate_id("stg").unwrap();
        let b = storage.generate_id("stg").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_metadata_round_trip() {
        let storage = create_test_storage();
        assert_eq!(storage.get_meta("missing").unwrap(), None);

        storage.set_meta("theme", "dark").unwrap();
        storage.set_meta("theme", "light").unwrap();
        assert_eq!(storage.get_meta("theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_workspace_requires_both_keys() {
        let storage = create_test_storage();
        assert_eq!(storage.workspace().unwrap(), None);

        storage.set_meta(CURRENT_COMPANY_KEY, "cmp-1").unwrap();
        assert_eq!(storage.workspace().unwrap(), None);

        let workspace = Workspace {
            company_id: "cmp-1".to_string(),
            user_id: "usr-1".to_string(),
        };
        storage.set_workspace(&workspace).unwrap();
        assert_eq!(storage.workspace().unwrap(), Some(workspace));
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats, StorageStats::default());
    }

    #[test]
    fn test_timestamps_round_trip_at_stored_precision() {
        let ts = now();
        let text = format_timestamp(&ts);
        assert!(text.ends_with('Z'));
        assert_eq!(
            DateTime::parse_from_rfc3339(&text).unwrap().with_timezone(&Utc),
            ts
        );
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let earlier = now();
        let later = earlier + chrono::Duration::milliseconds(1500);
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }

    #[test]
    fn test_open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("pipeline.db");

        let storage = Storage::open(&db_path).unwrap();
        storage.set_meta("k", "v").unwrap();
        assert_eq!(storage.path(), db_path);

        let stats = storage.stats().unwrap();
        assert!(stats.db_size_bytes > 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested_path = dir.path().join("nested/deeper/pipeline.db");

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());
        drop(storage);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("pipeline.db");

        Storage::open(&db_path)
            .unwrap()
            .set_meta("current_company_id", "cmp-1")
            .unwrap();

        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(
            reopened.get_meta("current_company_id").unwrap().as_deref(),
            Some("cmp-1")
        );
    }
}
