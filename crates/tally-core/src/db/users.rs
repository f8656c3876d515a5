//! User operations

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;
use crate::validate;

impl Database {
    /// Create a user; emails are unique case-insensitively
    pub fn create_user(&self, email: &str, name: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        let name = validate::sanitize_text(name, 100);
        validate::email(&email)?;
        validate::text_length("name", &name, 1, 100)?;

        if self.get_user_by_email(&email)?.is_some() {
            return Err(Error::Conflict(format!("User {} already exists", email)));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (email, name) VALUES (?, ?)",
            params![email, name],
        )?;
        let id = conn.last_insert_rowid();
        info!(user_id = id, "Created user");

        self.get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, email, name, created_at FROM users WHERE id = ?",
                params![id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, email, name, created_at FROM users WHERE email = ?",
                params![email.trim().to_lowercase()],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, email, name, created_at FROM users ORDER BY id")?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Delete a user and everything they own
    ///
    /// Children are removed before parents inside one transaction, so either
    /// the whole account disappears or nothing does.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        if self.get_user(id)?.is_none() {
            return Err(Error::NotFound(format!("user {}", id)));
        }

        let conn = self.conn()?;
        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| {
            conn.execute(
                "DELETE FROM goal_contributions WHERE goal_id IN (SELECT id FROM goals WHERE user_id = ?)",
                params![id],
            )?;
            conn.execute("DELETE FROM goals WHERE user_id = ?", params![id])?;
            conn.execute(
                "DELETE FROM budget_categories WHERE budget_id IN (SELECT id FROM budgets WHERE user_id = ?)",
                params![id],
            )?;
            conn.execute("DELETE FROM budgets WHERE user_id = ?", params![id])?;
            conn.execute("DELETE FROM transactions WHERE user_id = ?", params![id])?;
            conn.execute("DELETE FROM categories WHERE user_id = ?", params![id])?;
            conn.execute("DELETE FROM reports WHERE user_id = ?", params![id])?;
            conn.execute("DELETE FROM report_schedules WHERE user_id = ?", params![id])?;
            conn.execute("DELETE FROM audit_log WHERE user_id = ?", params![id])?;
            conn.execute("DELETE FROM users WHERE id = ?", params![id])?;
            Ok::<(), rusqlite::Error>(())
        })();

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])?;
                info!(user_id = id, "Deleted user and owned data");
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e.into())
            }
        }
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let created_at: String = row.get(3)?;
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            created_at: parse_datetime(&created_at),
        })
    }
}
