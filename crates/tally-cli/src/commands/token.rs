//! Bearer token command

use anyhow::{Context, Result};
use tally_core::db::Database;

use super::JWT_SECRET_ENV;

/// Mint a token for `user_id`, returning it
pub fn mint_token(db: &Database, secret: &str, user_id: i64, hours: i64) -> Result<String> {
    if secret.is_empty() {
        anyhow::bail!("{} must be set to mint tokens", JWT_SECRET_ENV);
    }
    if hours <= 0 {
        anyhow::bail!("--hours must be positive");
    }
    db.get_user(user_id)?
        .with_context(|| format!("User {} not found", user_id))?;

    tally_server::issue_token(secret, user_id, hours).context("Failed to sign token")
}

pub fn cmd_token(db: &Database, secret: &str, user_id: i64, hours: i64) -> Result<()> {
    let token = mint_token(db, secret, user_id, hours)?;
    // Token alone on stdout so it can be captured by scripts
    println!("{}", token);
    eprintln!("Valid for {} hours. Send as: Authorization: Bearer <token>", hours);
    Ok(())
}
