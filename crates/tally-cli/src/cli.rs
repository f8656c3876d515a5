//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Personal finance ledger, budgets, goals and reports
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Self-hosted personal finance backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed default categories
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only!)
        ///
        /// Requests then act as the user named by the X-User-Id header (default 1).
        #[arg(long)]
        no_auth: bool,
    },

    /// Manage users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Mint a bearer token for a user (requires TALLY_JWT_SECRET)
    Token {
        /// User id the token acts as
        #[arg(long)]
        user: i64,

        /// Token lifetime in hours
        #[arg(long, default_value = "24")]
        hours: i64,
    },

    /// Generate a report and print it as JSON
    Report {
        /// Report type: summary, category, monthly, budget, goals, cash_flow_forecast
        report_type: String,

        /// User id to report on
        #[arg(long)]
        user: i64,

        /// Named period: day, week, month, quarter, year, all (overrides --from/--to)
        #[arg(long)]
        period: Option<String>,

        /// Custom start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Custom end date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Entry type for the category report: income or expense
        #[arg(long)]
        category_type: Option<String>,

        /// First month of the monthly report (YYYY-MM)
        #[arg(long)]
        start_month: Option<String>,

        /// Number of months (monthly report or cash-flow forecast)
        #[arg(long)]
        months: Option<i64>,

        /// Save the generated report under this name
        #[arg(long)]
        save: Option<String>,
    },

    /// Export a saved report as JSON or CSV
    Export {
        /// Saved report id
        id: i64,

        /// Owner of the saved report
        #[arg(long)]
        user: i64,

        /// Output format: json or csv
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (defaults to the report's export file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// Create a user
    Add {
        /// Email address (unique)
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: String,
    },

    /// List users
    List,

    /// Delete a user and everything they own
    Delete {
        /// User id
        id: i64,
    },
}
