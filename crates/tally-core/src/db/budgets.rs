//! Budget and allocation operations

use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{parse_date_column, parse_datetime, AggregateFilter, Database};
use crate::error::{Error, Result};
use crate::models::{
    AllocationInput, Budget, BudgetAllocation, BudgetDetail, BudgetUpdate, CategoryRef,
    NewBudget, TransactionType,
};
use crate::progress::BudgetProgress;
use crate::validate;

const SELECT_BUDGET: &str = r#"
    SELECT id, user_id, name, amount, start_date, end_date, description, is_active,
           created_at, updated_at
    FROM budgets
"#;

impl Database {
    /// Create a budget with its allocations in one transaction
    pub fn create_budget(&self, user_id: i64, new: &NewBudget) -> Result<BudgetDetail> {
        check_budget_fields(&new.name, new.amount, new.start_date, new.end_date)?;
        self.check_allocations(user_id, &new.categories)?;

        let conn = self.conn()?;
        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| {
            conn.execute(
                r#"
                INSERT INTO budgets (user_id, name, amount, start_date, end_date, description)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
                params![
                    user_id,
                    new.name,
                    new.amount,
                    new.start_date.to_string(),
                    new.end_date.to_string(),
                    new.description,
                ],
            )?;
            let budget_id = conn.last_insert_rowid();
            insert_allocations(&conn, budget_id, &new.categories)?;
            Ok::<i64, rusqlite::Error>(budget_id)
        })();

        let budget_id = match result {
            Ok(id) => {
                conn.execute("COMMIT", [])?;
                id
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                return Err(e.into());
            }
        };
        info!(user_id, budget_id, "Created budget");

        self.get_budget_detail(user_id, budget_id)?
            .ok_or_else(|| Error::NotFound(format!("budget {}", budget_id)))
    }

    pub fn get_budget(&self, user_id: i64, id: i64) -> Result<Option<Budget>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE id = ? AND user_id = ?", SELECT_BUDGET);
        let budget = conn
            .query_row(&sql, params![id, user_id], Self::row_to_budget)
            .optional()?;
        Ok(budget)
    }

    /// A budget together with its allocations
    pub fn get_budget_detail(&self, user_id: i64, id: i64) -> Result<Option<BudgetDetail>> {
        let Some(budget) = self.get_budget(user_id, id)? else {
            return Ok(None);
        };
        let categories = self.allocations_for(id)?;
        Ok(Some(BudgetDetail { budget, categories }))
    }

    /// A user's budgets, most recent start first
    pub fn list_budgets(&self, user_id: i64, include_inactive: bool) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE user_id = ? AND (? OR is_active = 1) ORDER BY start_date DESC, id DESC",
            SELECT_BUDGET
        );
        let mut stmt = conn.prepare(&sql)?;
        let budgets = stmt
            .query_map(params![user_id, include_inactive], Self::row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    /// Active budgets whose window contains `today`
    pub fn current_budgets(&self, user_id: i64, today: NaiveDate) -> Result<Vec<Budget>> {
        self.budgets_overlapping(user_id, today, today)
    }

    /// Active budgets whose window intersects `[start, end]`
    pub fn budgets_overlapping(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let sql = format!(
            r#"
            {}
            WHERE user_id = ? AND is_active = 1 AND start_date <= ? AND end_date >= ?
            ORDER BY start_date, id
            "#,
            SELECT_BUDGET
        );
        let mut stmt = conn.prepare(&sql)?;
        let budgets = stmt
            .query_map(
                params![user_id, end.to_string(), start.to_string()],
                Self::row_to_budget,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    /// Apply a partial update; a present `categories` list replaces all allocations
    pub fn update_budget(
        &self,
        user_id: i64,
        id: i64,
        update: &BudgetUpdate,
    ) -> Result<BudgetDetail> {
        let existing = self
            .get_budget(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("budget {}", id)))?;

        let name = update.name.clone().unwrap_or(existing.name);
        let amount = update.amount.unwrap_or(existing.amount);
        let start_date = update.start_date.unwrap_or(existing.start_date);
        let end_date = update.end_date.unwrap_or(existing.end_date);
        let description = update.description.clone().unwrap_or(existing.description);
        let is_active = update.is_active.unwrap_or(existing.is_active);

        check_budget_fields(&name, amount, start_date, end_date)?;
        if let Some(categories) = &update.categories {
            self.check_allocations(user_id, categories)?;
        }

        let conn = self.conn()?;
        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| {
            conn.execute(
                r#"
                UPDATE budgets
                SET name = ?, amount = ?, start_date = ?, end_date = ?, description = ?,
                    is_active = ?, updated_at = CURRENT_TIMESTAMP
                WHERE id = ? AND user_id = ?
                "#,
                params![
                    name,
                    amount,
                    start_date.to_string(),
                    end_date.to_string(),
                    description,
                    is_active,
                    id,
                    user_id,
                ],
            )?;
            if let Some(categories) = &update.categories {
                conn.execute(
                    "DELETE FROM budget_categories WHERE budget_id = ?",
                    params![id],
                )?;
                insert_allocations(&conn, id, categories)?;
            }
            Ok::<(), rusqlite::Error>(())
        })();

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])?;
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                return Err(e.into());
            }
        }

        self.get_budget_detail(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("budget {}", id)))
    }

    /// Delete a budget and its allocations
    pub fn delete_budget(&self, user_id: i64, id: i64) -> Result<()> {
        if self.get_budget(user_id, id)?.is_none() {
            return Err(Error::NotFound(format!("budget {}", id)));
        }

        let conn = self.conn()?;
        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| {
            conn.execute(
                "DELETE FROM budget_categories WHERE budget_id = ?",
                params![id],
            )?;
            conn.execute(
                "DELETE FROM budgets WHERE id = ? AND user_id = ?",
                params![id, user_id],
            )?;
            Ok::<(), rusqlite::Error>(())
        })();

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])?;
                debug!(user_id, budget_id = id, "Deleted budget");
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e.into())
            }
        }
    }

    /// Allocations of a budget owned by `user_id`
    pub fn budget_allocations(&self, user_id: i64, budget_id: i64) -> Result<Vec<BudgetAllocation>> {
        if self.get_budget(user_id, budget_id)?.is_none() {
            return Err(Error::NotFound(format!("budget {}", budget_id)));
        }
        self.allocations_for(budget_id)
    }

    /// Progress over the budget's full window
    ///
    /// The budget-level spend counts every expense in the window, allocated
    /// or not; per-category progress is listed only for allocations.
    pub fn budget_progress(&self, user_id: i64, budget_id: i64) -> Result<BudgetProgress> {
        let budget = self
            .get_budget(user_id, budget_id)?
            .ok_or_else(|| Error::NotFound(format!("budget {}", budget_id)))?;
        let allocations = self.allocations_for(budget_id)?;
        let expenses = self.ledger_entries(
            user_id,
            &AggregateFilter::new(budget.start_date, budget.end_date).kind(TransactionType::Expense),
        )?;

        Ok(BudgetProgress::compute(budget, &allocations, &expenses))
    }

    pub(crate) fn allocations_for(&self, budget_id: i64) -> Result<Vec<BudgetAllocation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT bc.id, bc.budget_id, bc.category_id, c.name, c.icon, c.color, bc.amount
            FROM budget_categories bc
            JOIN categories c ON c.id = bc.category_id
            WHERE bc.budget_id = ?
            ORDER BY bc.id
            "#,
        )?;
        let allocations = stmt
            .query_map(params![budget_id], |row| {
                Ok(BudgetAllocation {
                    id: row.get(0)?,
                    budget_id: row.get(1)?,
                    category: CategoryRef {
                        id: row.get(2)?,
                        name: row.get(3)?,
                        icon: row.get(4)?,
                        color: row.get(5)?,
                    },
                    amount: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(allocations)
    }

    /// Allocation categories must be distinct expense categories the user can see
    fn check_allocations(&self, user_id: i64, allocations: &[AllocationInput]) -> Result<()> {
        let mut seen = HashSet::new();
        for allocation in allocations {
            if !seen.insert(allocation.category_id) {
                return Err(Error::validation(
                    "categories",
                    format!("category {} is allocated twice", allocation.category_id),
                ));
            }
            validate::min_amount("categories", allocation.amount, validate::MIN_AMOUNT)?;

            let category = self
                .get_accessible_category(user_id, allocation.category_id)?
                .ok_or_else(|| {
                    Error::validation(
                        "categories",
                        format!("category {} not found", allocation.category_id),
                    )
                })?;
            if category.kind != TransactionType::Expense {
                return Err(Error::validation(
                    "categories",
                    format!("category {} is not an expense category", category.id),
                ));
            }
        }
        Ok(())
    }

    fn row_to_budget(row: &rusqlite::Row) -> rusqlite::Result<Budget> {
        let start: String = row.get(4)?;
        let end: String = row.get(5)?;
        let active: i64 = row.get(7)?;
        let created_at: String = row.get(8)?;
        let updated_at: String = row.get(9)?;
        Ok(Budget {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            amount: row.get(3)?,
            start_date: parse_date_column(4, &start)?,
            end_date: parse_date_column(5, &end)?,
            description: row.get(6)?,
            is_active: active != 0,
            created_at: parse_datetime(&created_at),
            updated_at: parse_datetime(&updated_at),
        })
    }
}

fn check_budget_fields(name: &str, amount: f64, start: NaiveDate, end: NaiveDate) -> Result<()> {
    validate::text_length("name", name, 3, 100)?;
    validate::min_amount("amount", amount, validate::MIN_AMOUNT)?;
    if end < start {
        return Err(Error::validation(
            "end_date",
            "must be on or after start_date",
        ));
    }
    Ok(())
}

fn insert_allocations(
    conn: &Connection,
    budget_id: i64,
    allocations: &[AllocationInput],
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO budget_categories (budget_id, category_id, amount) VALUES (?, ?, ?)",
    )?;
    for allocation in allocations {
        stmt.execute(params![budget_id, allocation.category_id, allocation.amount])?;
    }
    Ok(())
}
