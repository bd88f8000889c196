//! Error types for leadboard.
//!
//! This module defines all error types used throughout the leadboard crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::EntityType;
use crate::validation::ValidationErrors;

/// The main error type for leadboard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored row could not be decoded.
    #[error("corrupt {table} row: {message}")]
    CorruptRow {
        /// Table the row came from.
        table: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Pipeline Errors ===
    /// Submitted form data did not pass validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: EntityType,
        /// The identifier that was not found.
        id: String,
    },

    /// A record belongs to a different company than the active one.
    #[error("{entity} {id} belongs to another company")]
    ForeignCompany {
        /// Kind of record.
        entity: EntityType,
        /// Its identifier.
        id: String,
    },

    /// A stage cannot be deleted while leads still sit in it.
    #[error("stage {stage_id} still holds {lead_count} lead(s); move them first")]
    StageNotEmpty {
        /// The stage that was going to be deleted.
        stage_id: String,
        /// How many leads it holds.
        lead_count: usize,
    },

    /// A user-supplied value could not be parsed.
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// The input field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    // === Workspace Errors ===
    /// No workspace has been set up in this database yet.
    #[error("workspace is not initialized; run `leadb init` first")]
    NotInitialized,

    /// The database already holds a workspace.
    #[error("workspace already initialized for company {company_id}")]
    AlreadyInitialized {
        /// The company that owns the workspace.
        company_id: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for leadboard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl Error {
    /// Create a new not-found error.
    #[must_use]
    pub fn not_found(entity: EntityType, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create a new foreign-company error.
    #[must_use]
    pub fn foreign_company(entity: EntityType, id: impl Into<String>) -> Self {
        Self::ForeignCompany {
            entity,
            id: id.into(),
        }
    }

    /// Create a new invalid-value error.
    #[must_use]
    pub fn invalid_value(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }

    /// Create a new corrupt-row error.
    #[must_use]
    pub fn corrupt_row(table: &'static str, message: impl Into<String>) -> Self {
        Self::CorruptRow {
            table,
            message: message.into(),
        }
    }

    /// Check if this error means a record was missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a form validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The per-field validation messages, if this is a validation failure.
    #[must_use]
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
