//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::db::Database;

/// Open (or create) the database file
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;

    // Opening already seeds; a second pass reports nothing new
    let added = db
        .seed_default_categories()
        .context("Failed to seed default categories")?;
    let categories = db.conn()?.query_row(
        "SELECT COUNT(*) FROM categories WHERE is_default = 1",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    println!("   Default categories: {} ({} added)", categories, added);

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Create a user: tally users add --email you@example.com --name You");
    println!("  2. Start the API: TALLY_JWT_SECRET=... tally serve");

    Ok(())
}
