//! `SQLite` schema definitions for leadboard.
//!
//! One table per record type. Timestamps are RFC 3339 text with a fixed
//! microsecond precision so they sort lexically.

/// Companies owning a pipeline.
pub const CREATE_COMPANIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS companies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    logo TEXT,
    owner_id TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// Users; `company_id` is NULL for super admins.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    role TEXT NOT NULL,
    company_id TEXT,
    avatar TEXT,
    created_at TEXT NOT NULL
)
";

/// Pipeline stages.
pub const CREATE_STAGES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS stages (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    stage_order INTEGER NOT NULL,
    company_id TEXT NOT NULL,
    color TEXT,
    created_at TEXT NOT NULL
)
";

/// Interest tags.
pub const CREATE_INTERESTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS interests (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    company_id TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// Leads. A stage can't be dropped from under its leads; a dropped interest
/// leaves its leads uncategorized.
pub const CREATE_LEADS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS leads (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    company_id TEXT NOT NULL,
    stage_id TEXT NOT NULL REFERENCES stages(id) ON DELETE RESTRICT,
    interest_id TEXT REFERENCES interests(id) ON DELETE SET NULL,
    assigned_to TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// Notes on leads.
pub const CREATE_NOTES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    lead_id TEXT NOT NULL REFERENCES leads(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// Scheduled activities.
pub const CREATE_ACTIVITIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS activities (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    lead_id TEXT NOT NULL REFERENCES leads(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    due_date TEXT NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    activity_type TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// Audit log. Entries outlive the records they describe, so no foreign keys.
pub const CREATE_LOGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS logs (
    id TEXT PRIMARY KEY,
    company_id TEXT,
    user_id TEXT NOT NULL,
    action TEXT NOT NULL,
    details TEXT NOT NULL,
    entity_id TEXT,
    entity_type TEXT,
    created_at TEXT NOT NULL
)
";

/// Per-company stage listing in board order.
pub const CREATE_STAGES_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_stages_company_order ON stages(company_id, stage_order)
";

/// Leads by company.
pub const CREATE_LEADS_COMPANY_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_leads_company ON leads(company_id)
";

/// Leads by stage, for board columns and stage deletion checks.
pub const CREATE_LEADS_STAGE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_leads_stage ON leads(stage_id)
";

/// Notes by lead.
pub const CREATE_NOTES_LEAD_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_notes_lead ON notes(lead_id)
";

/// Activities by lead.
pub const CREATE_ACTIVITIES_LEAD_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_activities_lead ON activities(lead_id)
";

/// Activities by due date, for the calendar.
pub const CREATE_ACTIVITIES_DUE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_activities_due ON activities(due_date)
";

/// Logs by company, newest first. Created by the version 2 migration,
/// once `logs.company_id` exists.
pub const CREATE_LOGS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_logs_company_created ON logs(company_id, created_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_COMPANIES_TABLE,
    CREATE_USERS_TABLE,
    CREATE_STAGES_TABLE,
    CREATE_INTERESTS_TABLE,
    CREATE_LEADS_TABLE,
    CREATE_NOTES_TABLE,
    CREATE_ACTIVITIES_TABLE,
    CREATE_LOGS_TABLE,
    CREATE_STAGES_INDEX,
    CREATE_LEADS_COMPANY_INDEX,
    CREATE_LEADS_STAGE_INDEX,
    CREATE_NOTES_LEAD_INDEX,
    CREATE_ACTIVITIES_LEAD_INDEX,
    CREATE_ACTIVITIES_DUE_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_leads_reference_stages_and_interests() {
        assert!(CREATE_LEADS_TABLE.contains("stage_id TEXT NOT NULL REFERENCES stages(id)"));
        assert!(CREATE_LEADS_TABLE.contains("ON DELETE SET NULL"));
    }

    #[test]
    fn test_children_cascade_with_leads() {
        assert!(CREATE_NOTES_TABLE.contains("ON DELETE CASCADE"));
        assert!(CREATE_ACTIVITIES_TABLE.contains("ON DELETE CASCADE"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
