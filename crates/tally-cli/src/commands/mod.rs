//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Database init and the shared `open_db` utility
//! - `reports` - Report generation and saved report export
//! - `serve` - Web server command
//! - `token` - Bearer token minting
//! - `users` - User management commands

pub mod core;
pub mod reports;
pub mod serve;
pub mod token;
pub mod users;

// Re-export command functions for main.rs
pub use core::*;
pub use reports::*;
pub use serve::*;
pub use token::*;
pub use users::*;

/// Environment variable holding the HS256 bearer token secret
pub const JWT_SECRET_ENV: &str = "TALLY_JWT_SECRET";

/// Environment variable listing allowed CORS origins (comma-separated)
pub const ALLOWED_ORIGINS_ENV: &str = "TALLY_ALLOWED_ORIGINS";

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
