//! `leadboard` - A sales-pipeline CRM
//!
//! Leads move through ordered pipeline stages, carry an optional interest
//! tag, and collect notes and scheduled activities. Every change lands in an
//! audit log. Board, calendar and analytics views are derived from an
//! in-memory snapshot of the active company's tables.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod analytics;
pub mod audit;
pub mod board;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod error;
pub mod kanban;
pub mod logging;
pub mod model;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use kanban::{ActivityUpdate, Kanban, Snapshot};
pub use logging::init_logging;
pub use storage::{Storage, StorageStats};
