//! Budget and goal progress calculators
//!
//! These are pure functions over already-fetched rows; the database layer
//! loads the inputs and calls in here.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calc::{clamped_percent, safe_ratio};
use crate::models::{Budget, BudgetAllocation, CategoryRef, Goal, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    OnTrack,
    Exceeded,
}

/// Spend against one allocated amount
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketProgress {
    pub spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

/// Progress of `spent` against `allocated`
///
/// `remaining` never goes below 0 and `percentage` is clamped to `[0, 100]`;
/// the status still reports `exceeded` once spend passes the allocation.
pub fn bucket_progress(allocated: f64, spent: f64) -> BucketProgress {
    BucketProgress {
        spent,
        remaining: (allocated - spent).max(0.0),
        percentage: clamped_percent(spent, allocated),
        status: if spent > allocated {
            BudgetStatus::Exceeded
        } else {
            BudgetStatus::OnTrack
        },
    }
}

/// Progress of one allocated category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryProgress {
    pub category: CategoryRef,
    pub budget_amount: f64,
    #[serde(flatten)]
    pub progress: BucketProgress,
}

/// Whole-budget progress plus one entry per allocation
#[derive(Debug, Clone, Serialize)]
pub struct BudgetProgress {
    pub budget: Budget,
    pub total_budget: f64,
    pub total_spent: f64,
    pub remaining: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
    pub categories: Vec<CategoryProgress>,
}

impl BudgetProgress {
    /// Compute progress from the expense entries counted against `budget`
    ///
    /// The budget-level figure sums every entry passed in; each allocation
    /// only sums the entries in its own category.
    pub fn compute(
        budget: Budget,
        allocations: &[BudgetAllocation],
        expenses: &[Transaction],
    ) -> Self {
        let total_spent: f64 = expenses.iter().map(|t| t.amount).sum();
        let overall = bucket_progress(budget.amount, total_spent);

        let categories = allocations
            .iter()
            .map(|allocation| {
                let spent: f64 = expenses
                    .iter()
                    .filter(|t| t.category_id == allocation.category.id)
                    .map(|t| t.amount)
                    .sum();
                CategoryProgress {
                    category: allocation.category.clone(),
                    budget_amount: allocation.amount,
                    progress: bucket_progress(allocation.amount, spent),
                }
            })
            .collect();

        Self {
            total_budget: budget.amount,
            total_spent,
            remaining: overall.remaining,
            percentage: overall.percentage,
            status: overall.status,
            categories,
            budget,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Completed,
    InProgress,
    Overdue,
    AtRisk,
    OnTrack,
}

impl GoalStatus {
    /// Overdue and at-risk goals both need attention
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::AtRisk | Self::Overdue)
    }
}

/// Days left before a goal is considered at risk
const AT_RISK_DAYS: i64 = 30;
/// Progress below which a goal close to its deadline is at risk
const AT_RISK_PERCENT: f64 = 75.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub percentage: f64,
    pub current_amount: f64,
    pub remaining_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_amount_needed: Option<f64>,
    pub status: GoalStatus,
}

/// Evaluate a goal's progress as of `today`
pub fn goal_progress(goal: &Goal, today: NaiveDate) -> GoalProgress {
    let percentage = clamped_percent(goal.current_amount, goal.target_amount);
    let remaining_amount = (goal.target_amount - goal.current_amount).max(0.0);

    let days_remaining = match goal.deadline {
        Some(deadline) if !goal.is_completed => Some((deadline - today).num_days().max(0)),
        _ => None,
    };

    let daily_amount_needed = match days_remaining {
        Some(days) if days > 0 && remaining_amount > 0.0 => {
            Some(safe_ratio(remaining_amount, days as f64))
        }
        _ => None,
    };

    let status = if goal.is_completed {
        GoalStatus::Completed
    } else {
        match goal.deadline {
            None => GoalStatus::InProgress,
            Some(deadline) if deadline < today => GoalStatus::Overdue,
            Some(_)
                if days_remaining.unwrap_or(0) <= AT_RISK_DAYS
                    && percentage < AT_RISK_PERCENT =>
            {
                GoalStatus::AtRisk
            }
            Some(_) => GoalStatus::OnTrack,
        }
    };

    GoalProgress {
        percentage,
        current_amount: goal.current_amount,
        remaining_amount,
        days_remaining,
        daily_amount_needed,
        status,
    }
}
