//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::ActivityType;

/// Workspace setup arguments.
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Name of the company that owns the pipeline
    #[arg(long)]
    pub company: String,

    /// Your name
    #[arg(long)]
    pub name: String,

    /// Your email address
    #[arg(long)]
    pub email: String,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Board command arguments.
#[derive(Debug, Args)]
pub struct BoardCommand {
    /// Only show leads with this interest
    #[arg(short, long, value_name = "INTEREST")]
    pub interest: Option<String>,

    /// Show one more page of a column (repeatable)
    #[arg(long = "more", value_name = "STAGE")]
    pub more: Vec<String>,

    /// Show every lead in every column
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Pipeline stage commands.
#[derive(Debug, Subcommand)]
pub enum StageCommand {
    /// List stages in pipeline order
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Append a stage to the end of the pipeline
    Add {
        /// Stage name
        name: String,

        /// Display color (#rgb or #rrggbb)
        #[arg(long)]
        color: Option<String>,
    },

    /// Rename a stage
    Rename {
        /// Stage id
        id: String,

        /// New name
        name: String,
    },

    /// Change or clear a stage's color
    Color {
        /// Stage id
        id: String,

        /// New color; omit to fall back to the default
        color: Option<String>,
    },

    /// Delete an empty stage
    Delete {
        /// Stage id
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Interest tag commands.
#[derive(Debug, Subcommand)]
pub enum InterestCommand {
    /// List interests
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Create an interest
    Add {
        /// Interest name
        name: String,
    },

    /// Rename an interest
    Rename {
        /// Interest id
        id: String,

        /// New name
        name: String,
    },

    /// Delete an interest; its leads become uncategorized
    Delete {
        /// Interest id
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Fields of a lead. On `edit`, omitted fields keep their value and an
/// empty value clears an optional field.
#[derive(Debug, Default, Args)]
pub struct LeadFields {
    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Stage id (defaults to the first stage)
    #[arg(short, long)]
    pub stage: Option<String>,

    /// Interest id
    #[arg(short, long)]
    pub interest: Option<String>,

    /// Id of the user the lead is assigned to
    #[arg(long, value_name = "USER")]
    pub assign: Option<String>,
}

/// Lead commands.
#[derive(Debug, Subcommand)]
pub enum LeadCommand {
    /// Create a lead
    Add {
        /// Lead name
        name: String,

        #[command(flatten)]
        fields: LeadFields,
    },

    /// Show a lead with its notes and activities
    Show {
        /// Lead id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Edit a lead
    Edit {
        /// Lead id
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: LeadFields,
    },

    /// Move a lead to another stage
    Move {
        /// Lead id
        id: String,

        /// Target stage id
        stage: String,
    },

    /// Delete a lead with its notes and activities
    Delete {
        /// Lead id
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Search leads by name
    Search {
        /// Text to look for in lead names
        #[arg(default_value = "")]
        query: String,

        /// Only leads with this interest
        #[arg(short, long)]
        interest: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Note commands.
#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    /// Add a note to a lead
    Add {
        /// Lead id
        lead: String,

        /// Note text
        content: String,
    },

    /// List a lead's notes, newest first
    List {
        /// Lead id
        lead: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },
}

/// Activity commands.
#[derive(Debug, Subcommand)]
pub enum ActivityCommand {
    /// Schedule an activity
    Add {
        /// Activity title
        title: String,

        /// Lead id
        #[arg(short, long)]
        lead: String,

        /// Kind of activity
        #[arg(short = 't', long = "type", value_enum, default_value = "follow-up")]
        activity_type: ActivityTypeArg,

        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Due time (HH:MM, local)
        #[arg(long, default_value = "09:00")]
        time: String,

        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },

    /// List activities by due date
    List {
        /// Only activities on this lead
        #[arg(short, long)]
        lead: Option<String>,

        /// Hide completed activities
        #[arg(short, long)]
        pending: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Edit an activity
    Edit {
        /// Activity id
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description; an empty value clears it
        #[arg(long)]
        description: Option<String>,

        /// Move the activity to another lead
        #[arg(short, long)]
        lead: Option<String>,

        /// New kind
        #[arg(short = 't', long = "type", value_enum)]
        activity_type: Option<ActivityTypeArg>,

        /// New due date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// New due time (HH:MM, local)
        #[arg(long)]
        time: Option<String>,
    },

    /// Flip an activity between pending and completed
    Toggle {
        /// Activity id
        id: String,
    },

    /// Delete an activity
    Delete {
        /// Activity id
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Calendar command arguments.
#[derive(Debug, Args)]
pub struct CalendarCommand {
    /// Show the week containing this date (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Go back one week per flag
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "next")]
    pub prev: u8,

    /// Go forward one week per flag
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub next: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Dashboard command arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    /// Include completed activities in the activity list
    #[arg(long)]
    pub show_completed: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Analytics command arguments.
#[derive(Debug, Args)]
pub struct AnalyticsCommand {
    /// Months of history in the performance table
    #[arg(short, long, default_value = "6")]
    pub months: u32,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Audit log command arguments.
#[derive(Debug, Args)]
pub struct LogsCommand {
    /// Only entries by this user id ("all" for everyone)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Maximum number of entries
    #[arg(short, long, default_value = "50")]
    pub limit: usize,

    /// List the users that appear in the log instead
    #[arg(long)]
    pub users: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Profile command arguments. Without flags the profile is shown.
#[derive(Debug, Args)]
pub struct ProfileCommand {
    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New email address
    #[arg(long)]
    pub email: Option<String>,

    /// New avatar URL; an empty value clears it
    #[arg(long)]
    pub avatar: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl ProfileCommand {
    /// Whether any field is being changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.name.is_some() || self.email.is_some() || self.avatar.is_some()
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Activity type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActivityTypeArg {
    /// Follow up with the lead
    FollowUp,
    /// A meeting
    Meeting,
    /// A phone call
    Call,
    /// An email
    Email,
    /// Anything else
    Other,
}

impl From<ActivityTypeArg> for ActivityType {
    fn from(arg: ActivityTypeArg) -> Self {
        match arg {
            ActivityTypeArg::FollowUp => Self::FollowUp,
            ActivityTypeArg::Meeting => Self::Meeting,
            ActivityTypeArg::Call => Self::Call,
            ActivityTypeArg::Email => Self::Email,
            ActivityTypeArg::Other => Self::Other,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
