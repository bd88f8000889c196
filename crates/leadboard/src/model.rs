//! Core pipeline records for leadboard.
//!
//! Plain records with string identifiers and foreign-key style references
//! (`Lead::stage_id` → `Stage::id`). Enums serialize as `snake_case` strings,
//! which is also the form they are stored in.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Color used for stages that don't carry one.
pub const DEFAULT_STAGE_COLOR: &str = "#64748b";

macro_rules! string_enum {
    ($ty:ident, $field:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Return the string representation used in storage.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(Error::invalid_value($field, format!("unknown value '{other}'"))),
                }
            }
        }
    };
}

/// Access level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages every company.
    SuperAdmin,
    /// Manages a single company.
    Admin,
    /// Works the pipeline of a company.
    Employee,
}

string_enum!(Role, "role" {
    SuperAdmin => "super_admin",
    Admin => "admin",
    Employee => "employee",
});

impl Role {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super administrator",
            Self::Admin => "Administrator",
            Self::Employee => "Employee",
        }
    }
}

/// Kind of a scheduled activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// Follow up with the lead (the default for new activities).
    #[default]
    FollowUp,
    /// A meeting.
    Meeting,
    /// A phone call.
    Call,
    /// An email.
    Email,
    /// Anything else.
    Other,
}

string_enum!(ActivityType, "activity type" {
    FollowUp => "follow_up",
    Meeting => "meeting",
    Call => "call",
    Email => "email",
    Other => "other",
});

impl ActivityType {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FollowUp => "Follow-up",
            Self::Meeting => "Meeting",
            Self::Call => "Call",
            Self::Email => "Email",
            Self::Other => "Other",
        }
    }
}

/// Kind of record an audit log entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A lead.
    Lead,
    /// A pipeline stage.
    Stage,
    /// An interest tag.
    Interest,
    /// A scheduled activity.
    Activity,
    /// A note on a lead.
    Note,
    /// A user.
    User,
    /// A company.
    Company,
}

string_enum!(EntityType, "entity type" {
    Lead => "lead",
    Stage => "stage",
    Interest => "interest",
    Activity => "activity",
    Note => "note",
    User => "user",
    Company => "company",
});

/// What happened in an audit log entry.
///
/// The three well-known actions get their own variants; anything else that
/// shows up in the log table is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    /// A record was created.
    Create,
    /// A record was changed.
    Update,
    /// A record was removed.
    Delete,
    /// Any other action string.
    #[serde(untagged)]
    Other(String),
}

impl LogAction {
    /// Return the string representation used in storage.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Other(action) => action,
        }
    }

    /// Human-readable label; unknown actions are shown as-is.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Create => "Created",
            Self::Update => "Updated",
            Self::Delete => "Deleted",
            Self::Other(action) => action,
        }
    }
}

impl From<&str> for LogAction {
    fn from(s: &str) -> Self {
        match s {
            "create" => Self::Create,
            "update" => Self::Update,
            "delete" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person using the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Access level.
    pub role: Role,
    /// Company the user belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    /// Avatar image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Avatar fallback text: the first letter of the first two words.
    #[must_use]
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// A company owning a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Unique identifier.
    pub id: String,
    /// Company name.
    pub name: String,
    /// Logo image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// User who owns the company.
    pub owner_id: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// A named, ordered step in the sales pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Unique identifier.
    pub id: String,
    /// Stage name.
    pub name: String,
    /// Position in the pipeline, ascending.
    pub order: i64,
    /// Owning company.
    pub company_id: String,
    /// Display color (`#rrggbb`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Stage {
    /// The stage color, falling back to [`DEFAULT_STAGE_COLOR`].
    #[must_use]
    pub fn color_or_default(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_STAGE_COLOR)
    }
}

/// A tag categorizing a lead's area of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    /// Unique identifier.
    pub id: String,
    /// Interest name.
    pub name: String,
    /// Owning company.
    pub company_id: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// A prospective customer tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Unique identifier.
    pub id: String,
    /// Lead name.
    pub name: String,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number as entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Owning company.
    pub company_id: String,
    /// Stage the lead sits in.
    pub stage_id: String,
    /// Interest tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_id: Option<String>,
    /// User responsible for the lead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Avatar fallback text.
    #[must_use]
    pub fn initials(&self) -> String {
        initials(&self.name)
    }

    /// The lead's phone reduced to its digits.
    #[must_use]
    pub fn phone_digits(&self) -> Option<String> {
        let digits: String = self
            .phone
            .as_deref()?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        (!digits.is_empty()).then_some(digits)
    }

    /// Click-to-chat link for the lead's phone number.
    #[must_use]
    pub fn whatsapp_url(&self) -> Option<String> {
        self.phone_digits()
            .map(|digits| format!("https://wa.me/{digits}"))
    }
}

/// A free-text note attached to a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier.
    pub id: String,
    /// Note text.
    pub content: String,
    /// The lead this belongs to.
    pub lead_id: String,
    /// The user who wrote it.
    pub user_id: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// A scheduled, typed task tied to a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The lead this belongs to.
    pub lead_id: String,
    /// The user who scheduled it.
    pub user_id: String,
    /// When it is due.
    pub due_date: DateTime<Utc>,
    /// Whether it has been done.
    pub completed: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Kind of activity.
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
}

/// An audit trail record of a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier.
    pub id: String,
    /// The user who acted.
    pub user_id: String,
    /// What happened.
    pub action: LogAction,
    /// Human-readable summary.
    pub details: String,
    /// Id of the affected record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Kind of the affected record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// First two characters of a name, uppercased.
fn initials(name: &str) -> String {
    name.trim().chars().take(2).flat_map(char::to_uppercase).collect()
}
