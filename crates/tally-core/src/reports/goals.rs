//! Savings goals overview

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::calc::{clamped_percent, percent_of};
use crate::db::Database;
use crate::error::Result;
use crate::models::Goal;
use crate::progress::{goal_progress, GoalProgress};

#[derive(Debug, Clone, Serialize)]
pub struct GoalWithProgress {
    pub goal: Goal,
    pub progress: GoalProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalsSummary {
    pub total_goals: usize,
    pub completed_goals: usize,
    pub active_goals: usize,
    /// At-risk and overdue goals
    pub at_risk_goals: usize,
    pub total_saved: f64,
    pub total_target: f64,
    pub overall_progress: f64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalsReport {
    pub summary: GoalsSummary,
    pub goals: Vec<GoalWithProgress>,
    pub generated_at: DateTime<Utc>,
}

/// Every goal the user has, with progress evaluated as of `today`
pub fn goals_report(db: &Database, user_id: i64, today: NaiveDate) -> Result<GoalsReport> {
    let goals: Vec<GoalWithProgress> = db
        .all_goals(user_id)?
        .into_iter()
        .map(|goal| {
            let progress = goal_progress(&goal, today);
            GoalWithProgress { goal, progress }
        })
        .collect();

    Ok(GoalsReport {
        summary: summarize(&goals),
        goals,
        generated_at: Utc::now(),
    })
}

fn summarize(goals: &[GoalWithProgress]) -> GoalsSummary {
    let total_goals = goals.len();
    let completed_goals = goals.iter().filter(|g| g.goal.is_completed).count();
    let at_risk_goals = goals
        .iter()
        .filter(|g| g.progress.status.needs_attention())
        .count();
    let total_saved: f64 = goals.iter().map(|g| g.goal.current_amount).sum();
    let total_target: f64 = goals.iter().map(|g| g.goal.target_amount).sum();

    GoalsSummary {
        total_goals,
        completed_goals,
        active_goals: total_goals - completed_goals,
        at_risk_goals,
        total_saved,
        total_target,
        overall_progress: clamped_percent(total_saved, total_target),
        completion_rate: percent_of(completed_goals as f64, total_goals as f64),
    }
}
