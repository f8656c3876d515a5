//! Category operations

use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Category, CategoryUpdate, NewCategory, TransactionType};
use crate::validate;

/// Categories shared by every user: (name, type, icon, color)
const DEFAULT_CATEGORIES: &[(&str, TransactionType, &str, &str)] = &[
    ("Salary", TransactionType::Income, "briefcase", "#2e7d32"),
    ("Freelance", TransactionType::Income, "laptop", "#388e3c"),
    ("Investments", TransactionType::Income, "trending-up", "#43a047"),
    ("Other Income", TransactionType::Income, "plus-circle", "#66bb6a"),
    ("Housing", TransactionType::Expense, "home", "#c62828"),
    ("Food", TransactionType::Expense, "shopping-cart", "#ef6c00"),
    ("Transport", TransactionType::Expense, "car", "#1565c0"),
    ("Utilities", TransactionType::Expense, "zap", "#6a1b9a"),
    ("Health", TransactionType::Expense, "heart", "#ad1457"),
    ("Education", TransactionType::Expense, "book", "#00838f"),
    ("Entertainment", TransactionType::Expense, "film", "#f9a825"),
    ("Other Expenses", TransactionType::Expense, "more-horizontal", "#757575"),
];

const CATEGORY_COLUMNS: &str = "id, name, type, icon, color, user_id, is_default";

impl Database {
    /// Insert the shared default categories that are not present yet
    pub fn seed_default_categories(&self) -> Result<usize> {
        let conn = self.conn()?;
        let mut inserted = 0;

        for (name, kind, icon, color) in DEFAULT_CATEGORIES {
            inserted += conn.execute(
                r#"
                INSERT INTO categories (name, type, icon, color, user_id, is_default)
                SELECT ?, ?, ?, ?, NULL, 1
                WHERE NOT EXISTS (
                    SELECT 1 FROM categories WHERE name = ? AND type = ? AND is_default = 1
                )
                "#,
                params![name, kind.as_str(), icon, color, name, kind.as_str()],
            )?;
        }

        if inserted > 0 {
            info!(count = inserted, "Seeded default categories");
        }
        Ok(inserted)
    }

    /// Create a category owned by `user_id`
    pub fn create_category(&self, user_id: i64, new: &NewCategory) -> Result<Category> {
        validate::text_length("name", &new.name, 1, 50)?;

        let conn = self.conn()?;
        let duplicate: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE user_id = ? AND name = ? AND type = ?",
                params![user_id, new.name, new.kind.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if duplicate.is_some() {
            return Err(Error::Conflict(format!(
                "Category '{}' already exists",
                new.name
            )));
        }

        conn.execute(
            r#"
            INSERT INTO categories (name, type, icon, color, user_id, is_default)
            VALUES (?, ?, ?, ?, ?, 0)
            "#,
            params![new.name, new.kind.as_str(), new.icon, new.color, user_id],
        )?;
        let id = conn.last_insert_rowid();
        debug!(user_id, category_id = id, "Created category");

        self.get_accessible_category(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("category {}", id)))
    }

    /// Categories visible to a user: defaults first, then by name
    pub fn list_categories(
        &self,
        user_id: i64,
        kind: Option<TransactionType>,
    ) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM categories
            WHERE (is_default = 1 OR user_id = ?1)
              AND (?2 IS NULL OR type = ?2)
            ORDER BY is_default DESC, name
            "#,
            CATEGORY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let categories = stmt
            .query_map(
                params![user_id, kind.map(|k| k.as_str())],
                Self::row_to_category,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// A default category or one owned by `user_id`
    pub fn get_accessible_category(&self, user_id: i64, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM categories WHERE id = ? AND (is_default = 1 OR user_id = ?)",
            CATEGORY_COLUMNS
        );
        let category = conn
            .query_row(&sql, params![id, user_id], Self::row_to_category)
            .optional()?;
        Ok(category)
    }

    /// Look up a category the user may modify
    fn owned_category(&self, user_id: i64, id: i64) -> Result<Category> {
        match self.get_accessible_category(user_id, id)? {
            Some(c) if c.is_default => Err(Error::Conflict(
                "Default categories cannot be modified".to_string(),
            )),
            Some(c) => Ok(c),
            None => Err(Error::NotFound(format!("category {}", id))),
        }
    }

    pub fn update_category(
        &self,
        user_id: i64,
        id: i64,
        update: &CategoryUpdate,
    ) -> Result<Category> {
        let existing = self.owned_category(user_id, id)?;

        let name = update.name.clone().unwrap_or(existing.name);
        validate::text_length("name", &name, 1, 50)?;
        let icon = update.icon.clone().unwrap_or(existing.icon);
        let color = update.color.clone().unwrap_or(existing.color);

        let conn = self.conn()?;
        let duplicate: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE user_id = ? AND name = ? AND type = ? AND id != ?",
                params![user_id, name, existing.kind.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;
        if duplicate.is_some() {
            return Err(Error::Conflict(format!("Category '{}' already exists", name)));
        }

        conn.execute(
            "UPDATE categories SET name = ?, icon = ?, color = ? WHERE id = ? AND user_id = ?",
            params![name, icon, color, id, user_id],
        )?;

        self.get_accessible_category(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("category {}", id)))
    }

    /// Delete a user category that no ledger entry or allocation references
    pub fn delete_category(&self, user_id: i64, id: i64) -> Result<()> {
        self.owned_category(user_id, id)?;

        let conn = self.conn()?;
        let references: i64 = conn.query_row(
            r#"
            SELECT (SELECT COUNT(*) FROM transactions WHERE category_id = ?1)
                 + (SELECT COUNT(*) FROM budget_categories WHERE category_id = ?1)
            "#,
            params![id],
            |row| row.get(0),
        )?;
        if references > 0 {
            return Err(Error::Conflict(
                "Category is in use and cannot be deleted".to_string(),
            ));
        }

        conn.execute(
            "DELETE FROM categories WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(())
    }

    fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
        let kind_str: String = row.get(2)?;
        let is_default: i64 = row.get(6)?;
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            kind: kind_str.parse().unwrap_or(TransactionType::Expense),
            icon: row.get(3)?,
            color: row.get(4)?,
            user_id: row.get(5)?,
            is_default: is_default != 0,
        })
    }
}
