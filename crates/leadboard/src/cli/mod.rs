//! Command-line interface for leadboard.
//!
//! This module provides the CLI structure and output rendering for the
//! `leadb` binary.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ActivityCommand, ActivityTypeArg, AnalyticsCommand, BoardCommand, CalendarCommand,
    ConfigCommand, DashboardCommand, InitCommand, InterestCommand, LeadCommand, LeadFields,
    LogsCommand, NoteCommand, OutputFormat, ProfileCommand, StageCommand, StatusCommand,
};

use crate::logging::Verbosity;

/// leadb - Work a sales pipeline from the terminal
///
/// Track leads through ordered pipeline stages, tag them with interests,
/// keep notes, schedule follow-ups, and watch the numbers.
#[derive(Debug, Parser)]
#[command(name = "leadb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the company, your user and the default stages
    Init(InitCommand),

    /// Show workspace and database status
    Status(StatusCommand),

    /// Show the pipeline board
    Board(BoardCommand),

    /// Manage pipeline stages
    #[command(subcommand)]
    Stage(StageCommand),

    /// Manage interest tags
    #[command(subcommand)]
    Interest(InterestCommand),

    /// Manage leads
    #[command(subcommand)]
    Lead(LeadCommand),

    /// Read and write notes on leads
    #[command(subcommand)]
    Note(NoteCommand),

    /// Schedule and track activities
    #[command(subcommand)]
    Activity(ActivityCommand),

    /// Show a week of activities
    Calendar(CalendarCommand),

    /// Show headline numbers and what needs attention
    Dashboard(DashboardCommand),

    /// Show pipeline analytics
    Analytics(AnalyticsCommand),

    /// Show the audit log
    Logs(LogsCommand),

    /// Show or update your profile
    Profile(ProfileCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "leadb");
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_init() {
        let args = [
            "leadb", "init", "--company", "Acme", "--name", "Ana", "--email", "ana@acme.test",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Init(init) => {
                assert_eq!(init.company, "Acme");
                assert_eq!(init.email, "ana@acme.test");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_board_more() {
        let args = ["leadb", "board", "--more", "stg-1", "--more", "stg-1", "-i", "int-1"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Board(board) => {
                assert_eq!(board.more, ["stg-1", "stg-1"]);
                assert_eq!(board.interest.as_deref(), Some("int-1"));
                assert_eq!(board.format, OutputFormat::Plain);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_lead_add_with_fields() {
        let args = [
            "leadb", "lead", "add", "Ana Souza", "--email", "ana@x.test", "-s", "stg-1",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Lead(LeadCommand::Add { name, fields }) => {
                assert_eq!(name, "Ana Souza");
                assert_eq!(fields.email.as_deref(), Some("ana@x.test"));
                assert_eq!(fields.stage.as_deref(), Some("stg-1"));
                assert!(fields.interest.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_activity_add_defaults() {
        let args = [
            "leadb", "activity", "add", "Call back", "-l", "led-1", "-d", "2026-10-20",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Activity(ActivityCommand::Add {
                activity_type,
                time,
                ..
            }) => {
                assert_eq!(activity_type, ActivityTypeArg::FollowUp);
                assert_eq!(time, "09:00");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_activity_type() {
        let args = [
            "leadb", "activity", "add", "Demo", "-l", "led-1", "-d", "2026-10-20", "-t", "meeting",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Activity(ActivityCommand::Add {
                activity_type: ActivityTypeArg::Meeting,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_calendar_navigation() {
        let cli = Cli::try_parse_from(["leadb", "calendar", "-pp"]).unwrap();
        match cli.command {
            Command::Calendar(cal) => assert_eq!(cal.prev, 2),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["leadb", "calendar", "-p", "-n"]).is_err());
    }

    #[test]
    fn test_parse_logs_user_filter() {
        let cli = Cli::try_parse_from(["leadb", "logs", "--user", "usr-1", "-f", "json"]).unwrap();
        match cli.command {
            Command::Logs(logs) => {
                assert_eq!(logs.user.as_deref(), Some("usr-1"));
                assert_eq!(logs.format, OutputFormat::Json);
                assert_eq!(logs.limit, 50);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_with_config() {
        let args = ["leadb", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(["leadb", "-v", "status"]).unwrap();
        assert_eq!(cli.verbose, 1);
        let cli = Cli::try_parse_from(["leadb", "-q", "dashboard"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_unknown_activity_type_rejected() {
        let args = [
            "leadb", "activity", "add", "Lunch", "-l", "led-1", "-d", "2026-10-20", "-t", "lunch",
        ];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
