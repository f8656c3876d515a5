//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::{open_db, ALLOWED_ORIGINS_ENV, JWT_SECRET_ENV};

/// Split a comma-separated origin list, dropping empty entries
pub fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, no_auth: bool) -> Result<()> {
    println!("🚀 Starting Tally web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    let allowed_origins = parse_origins(&std::env::var(ALLOWED_ORIGINS_ENV).unwrap_or_default());
    let jwt_secret = std::env::var(JWT_SECRET_ENV)
        .ok()
        .filter(|s| !s.is_empty());

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
        println!("      Requests act as the user in the X-User-Id header (default 1)");
    } else if jwt_secret.is_some() {
        println!("   🔒 Authentication: bearer tokens ({})", JWT_SECRET_ENV);
    } else {
        anyhow::bail!(
            "{} must be set unless --no-auth is given",
            JWT_SECRET_ENV
        );
    }
    if !allowed_origins.is_empty() {
        println!(
            "   🌐 Allowed origins: {} ({})",
            allowed_origins.join(", "),
            ALLOWED_ORIGINS_ENV
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;

    let config = tally_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        jwt_secret,
    };

    tally_server::serve(db, host, port, config).await?;

    Ok(())
}
