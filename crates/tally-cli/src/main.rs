//! Tally CLI - Personal finance backend
//!
//! Usage:
//!   tally init                         Initialize database
//!   tally users add --email E --name N Create a user
//!   tally token --user 1               Mint a bearer token
//!   tally report summary --user 1      Print a report as JSON
//!   tally serve --port 3000            Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&cli.db, &host, port, no_auth).await,
        Commands::Users { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                UsersAction::Add { email, name } => commands::cmd_users_add(&db, &email, &name),
                UsersAction::List => commands::cmd_users_list(&db),
                UsersAction::Delete { id } => commands::cmd_users_delete(&db, id),
            }
        }
        Commands::Token { user, hours } => {
            let db = commands::open_db(&cli.db)?;
            let secret = std::env::var(commands::JWT_SECRET_ENV).unwrap_or_default();
            commands::cmd_token(&db, &secret, user, hours)
        }
        Commands::Report {
            report_type,
            user,
            period,
            from,
            to,
            category_type,
            start_month,
            months,
            save,
        } => {
            let db = commands::open_db(&cli.db)?;
            let args = commands::ReportArgs {
                report_type,
                period,
                from,
                to,
                category_type,
                start_month,
                months,
                save,
            };
            commands::cmd_report(&db, user, &args)
        }
        Commands::Export {
            id,
            user,
            format,
            output,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_export(&db, user, id, &format, output.as_deref())
        }
    }
}
