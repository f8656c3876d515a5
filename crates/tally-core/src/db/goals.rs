//! Savings goal and contribution operations

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use super::{parse_date_column, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    ContributionResult, Goal, GoalContribution, GoalUpdate, NewContribution, NewGoal,
};
use crate::validate;

const SELECT_GOAL: &str = r#"
    SELECT id, user_id, name, target_amount, current_amount, deadline, description, category,
           icon, is_active, is_completed, completed_date, created_at, updated_at
    FROM goals
"#;

/// Completion flag and date after the amounts change
///
/// The date is set to `on` when the goal flips to completed, kept while it
/// stays completed, and cleared when it drops back below target.
fn completion_state(
    current_amount: f64,
    target_amount: f64,
    was_completed: bool,
    previous_date: Option<NaiveDate>,
    on: NaiveDate,
) -> (bool, Option<NaiveDate>) {
    let completed = current_amount >= target_amount;
    let date = match (was_completed, completed) {
        (false, true) => Some(on),
        (true, true) => previous_date.or(Some(on)),
        (_, false) => None,
    };
    (completed, date)
}

impl Database {
    pub fn create_goal(&self, user_id: i64, new: &NewGoal) -> Result<Goal> {
        check_goal_fields(&new.name, new.target_amount, new.current_amount)?;

        let today = Utc::now().date_naive();
        let (is_completed, completed_date) =
            completion_state(new.current_amount, new.target_amount, false, None, today);

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO goals (user_id, name, target_amount, current_amount, deadline,
                               description, category, icon, is_completed, completed_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                new.name,
                new.target_amount,
                new.current_amount,
                new.deadline.map(|d| d.to_string()),
                new.description,
                new.category,
                new.icon,
                is_completed,
                completed_date.map(|d| d.to_string()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(user_id, goal_id = id, "Created goal");

        self.get_goal(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("goal {}", id)))
    }

    pub fn get_goal(&self, user_id: i64, id: i64) -> Result<Option<Goal>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE id = ? AND user_id = ?", SELECT_GOAL);
        let goal = conn
            .query_row(&sql, params![id, user_id], Self::row_to_goal)
            .optional()?;
        Ok(goal)
    }

    /// Active goals: nearest deadline first, undated last, then by progress
    pub fn list_goals(&self, user_id: i64, include_completed: bool) -> Result<Vec<Goal>> {
        let conn = self.conn()?;
        let sql = format!(
            r#"
            {}
            WHERE user_id = ? AND is_active = 1 AND (? OR is_completed = 0)
            ORDER BY deadline IS NULL, deadline,
                     CASE WHEN target_amount > 0 THEN current_amount / target_amount ELSE 0 END DESC,
                     id
            "#,
            SELECT_GOAL
        );
        let mut stmt = conn.prepare(&sql)?;
        let goals = stmt
            .query_map(params![user_id, include_completed], Self::row_to_goal)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    /// Every goal the user owns, active or not
    pub fn all_goals(&self, user_id: i64) -> Result<Vec<Goal>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE user_id = ? ORDER BY id", SELECT_GOAL);
        let mut stmt = conn.prepare(&sql)?;
        let goals = stmt
            .query_map(params![user_id], Self::row_to_goal)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    pub fn update_goal(&self, user_id: i64, id: i64, update: &GoalUpdate) -> Result<Goal> {
        let existing = self
            .get_goal(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("goal {}", id)))?;

        let name = update.name.clone().unwrap_or(existing.name);
        let target_amount = update.target_amount.unwrap_or(existing.target_amount);
        let current_amount = update.current_amount.unwrap_or(existing.current_amount);
        let deadline = update.deadline.unwrap_or(existing.deadline);
        let description = update.description.clone().unwrap_or(existing.description);
        let category = update.category.clone().unwrap_or(existing.category);
        let icon = update.icon.clone().unwrap_or(existing.icon);
        let is_active = update.is_active.unwrap_or(existing.is_active);

        check_goal_fields(&name, target_amount, current_amount)?;

        let (is_completed, completed_date) = completion_state(
            current_amount,
            target_amount,
            existing.is_completed,
            existing.completed_date,
            Utc::now().date_naive(),
        );

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE goals
            SET name = ?, target_amount = ?, current_amount = ?, deadline = ?, description = ?,
                category = ?, icon = ?, is_active = ?, is_completed = ?, completed_date = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND user_id = ?
            "#,
            params![
                name,
                target_amount,
                current_amount,
                deadline.map(|d| d.to_string()),
                description,
                category,
                icon,
                is_active,
                is_completed,
                completed_date.map(|d| d.to_string()),
                id,
                user_id,
            ],
        )?;

        self.get_goal(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("goal {}", id)))
    }

    /// Delete a goal and its contributions
    pub fn delete_goal(&self, user_id: i64, id: i64) -> Result<()> {
        if self.get_goal(user_id, id)?.is_none() {
            return Err(Error::NotFound(format!("goal {}", id)));
        }

        let conn = self.conn()?;
        conn.execute("BEGIN TRANSACTION", [])?;

        let result = (|| {
            conn.execute(
                "DELETE FROM goal_contributions WHERE goal_id = ?",
                params![id],
            )?;
            conn.execute(
                "DELETE FROM goals WHERE id = ? AND user_id = ?",
                params![id, user_id],
            )?;
            Ok::<(), rusqlite::Error>(())
        })();

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])?;
                debug!(user_id, goal_id = id, "Deleted goal");
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e.into())
            }
        }
    }

    /// Record a contribution and move the goal's balance in one transaction
    ///
    /// A goal reaching its target is completed as of the contribution date.
    pub fn add_goal_contribution(
        &self,
        user_id: i64,
        goal_id: i64,
        new: &NewContribution,
    ) -> Result<ContributionResult> {
        validate::min_amount("amount", new.amount, validate::MIN_AMOUNT)?;
        let date = new.date.unwrap_or_else(|| Utc::now().date_naive());

        let conn = self.conn()?;
        // Write lock must be held before current_amount is read
        conn.execute("BEGIN IMMEDIATE TRANSACTION", [])?;

        let result = (|| {
            let sql = format!("{} WHERE id = ? AND user_id = ?", SELECT_GOAL);
            let goal = conn
                .query_row(&sql, params![goal_id, user_id], Self::row_to_goal)
                .optional()?
                .ok_or_else(|| Error::NotFound(format!("goal {}", goal_id)))?;

            conn.execute(
                "INSERT INTO goal_contributions (goal_id, amount, date, notes) VALUES (?, ?, ?, ?)",
                params![goal_id, new.amount, date.to_string(), new.notes],
            )?;
            let contribution_id = conn.last_insert_rowid();

            let current_amount = goal.current_amount + new.amount;
            let (is_completed, completed_date) = completion_state(
                current_amount,
                goal.target_amount,
                goal.is_completed,
                goal.completed_date,
                date,
            );

            conn.execute(
                r#"
                UPDATE goals
                SET current_amount = ?, is_completed = ?, completed_date = ?,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = ?
                "#,
                params![
                    current_amount,
                    is_completed,
                    completed_date.map(|d| d.to_string()),
                    goal_id,
                ],
            )?;

            let goal = conn.query_row(&sql, params![goal_id, user_id], Self::row_to_goal)?;
            let contribution = conn.query_row(
                "SELECT id, goal_id, amount, date, notes, created_at FROM goal_contributions WHERE id = ?",
                params![contribution_id],
                Self::row_to_contribution,
            )?;
            Ok::<ContributionResult, Error>(ContributionResult { goal, contribution })
        })();

        match result {
            Ok(outcome) => {
                conn.execute("COMMIT", [])?;
                info!(
                    user_id,
                    goal_id,
                    completed = outcome.goal.is_completed,
                    "Recorded goal contribution"
                );
                Ok(outcome)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    /// Contributions to a goal, newest first
    pub fn list_goal_contributions(
        &self,
        user_id: i64,
        goal_id: i64,
    ) -> Result<Vec<GoalContribution>> {
        if self.get_goal(user_id, goal_id)?.is_none() {
            return Err(Error::NotFound(format!("goal {}", goal_id)));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, goal_id, amount, date, notes, created_at
            FROM goal_contributions
            WHERE goal_id = ?
            ORDER BY date DESC, id DESC
            "#,
        )?;
        let contributions = stmt
            .query_map(params![goal_id], Self::row_to_contribution)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(contributions)
    }

    fn row_to_goal(row: &rusqlite::Row) -> rusqlite::Result<Goal> {
        let deadline: Option<String> = row.get(5)?;
        let active: i64 = row.get(9)?;
        let completed: i64 = row.get(10)?;
        let completed_date: Option<String> = row.get(11)?;
        let created_at: String = row.get(12)?;
        let updated_at: String = row.get(13)?;
        Ok(Goal {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            target_amount: row.get(3)?,
            current_amount: row.get(4)?,
            deadline: deadline
                .as_deref()
                .map(|d| parse_date_column(5, d))
                .transpose()?,
            description: row.get(6)?,
            category: row.get(7)?,
            icon: row.get(8)?,
            is_active: active != 0,
            is_completed: completed != 0,
            completed_date: completed_date
                .as_deref()
                .map(|d| parse_date_column(11, d))
                .transpose()?,
            created_at: parse_datetime(&created_at),
            updated_at: parse_datetime(&updated_at),
        })
    }

    fn row_to_contribution(row: &rusqlite::Row) -> rusqlite::Result<GoalContribution> {
        let date: String = row.get(3)?;
        let created_at: String = row.get(5)?;
        Ok(GoalContribution {
            id: row.get(0)?,
            goal_id: row.get(1)?,
            amount: row.get(2)?,
            date: parse_date_column(3, &date)?,
            notes: row.get(4)?,
            created_at: parse_datetime(&created_at),
        })
    }
}

fn check_goal_fields(name: &str, target_amount: f64, current_amount: f64) -> Result<()> {
    validate::text_length("name", name, 3, 100)?;
    validate::min_amount("target_amount", target_amount, validate::MIN_AMOUNT)?;
    validate::min_amount("current_amount", current_amount, 0.0)?;
    Ok(())
}
