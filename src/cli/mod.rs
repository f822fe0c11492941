//! Command-line interface for visitrack.

mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::VisitorId;

/// visitrack - building visitor registry
/// Front-desk visitor log with entry/exit tracking and audit trail
#[derive(Parser)]
#[command(name = "visitrack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Export the entry/exit report as CSV
    Report {
        /// First day of the range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day of the range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Only visits of this visitor id
        #[arg(long)]
        visitor: Option<VisitorId>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the most recent audit entries
    Audit {
        /// Number of entries to show
        #[arg(default_value = "20")]
        limit: u64,
    },
}

pub use commands::*;
