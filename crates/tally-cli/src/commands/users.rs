//! User management commands

use anyhow::{Context, Result};
use tally_core::db::Database;
use tracing::warn;

use super::truncate;

pub fn cmd_users_add(db: &Database, email: &str, name: &str) -> Result<()> {
    let user = db
        .create_user(email, name)
        .context("Failed to create user")?;
    println!("✅ Created user {} ({}, id {})", user.name, user.email, user.id);
    Ok(())
}

pub fn cmd_users_list(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    if users.is_empty() {
        println!("No users yet. Add one with: tally users add --email E --name N");
        return Ok(());
    }

    println!("{:>5}  {:<32}  {:<24}  Created", "ID", "Email", "Name");
    println!("{}", "─".repeat(80));
    for user in &users {
        println!(
            "{:>5}  {:<32}  {:<24}  {}",
            user.id,
            truncate(&user.email, 32),
            truncate(&user.name, 24),
            user.created_at.format("%Y-%m-%d")
        );
    }
    println!();
    println!("{} user(s)", users.len());

    Ok(())
}

pub fn cmd_users_delete(db: &Database, id: i64) -> Result<()> {
    db.delete_user(id)
        .with_context(|| format!("Failed to delete user {}", id))?;
    warn!(user_id = id, "Deleted user and all owned data");
    println!("🗑️  Deleted user {} and all of their data", id);
    Ok(())
}
