//! Budget performance within a reporting window

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::ReportPeriod;
use crate::db::{AggregateFilter, Database};
use crate::error::Result;
use crate::models::TransactionType;
use crate::progress::BudgetProgress;

/// One budget's progress restricted to the window it shares with the report
#[derive(Debug, Clone, Serialize)]
pub struct BudgetReportItem {
    #[serde(flatten)]
    pub progress: BudgetProgress,
    pub period: ReportPeriod,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetReport {
    pub period: ReportPeriod,
    pub budgets: Vec<BudgetReportItem>,
    pub budget_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Progress of every active budget overlapping `[start, end]`
///
/// Spend is counted only inside the intersection of the two windows. A
/// budget with allocations only counts expenses in its allocated categories.
pub fn budget_report(
    db: &Database,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BudgetReport> {
    let budgets = db.budgets_overlapping(user_id, start, end)?;

    let mut items = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let window_start = budget.start_date.max(start);
        let window_end = budget.end_date.min(end);

        let allocations = db.allocations_for(budget.id)?;
        let mut expenses = db.ledger_entries(
            user_id,
            &AggregateFilter::new(window_start, window_end).kind(TransactionType::Expense),
        )?;
        if !allocations.is_empty() {
            let allocated: HashSet<i64> = allocations.iter().map(|a| a.category.id).collect();
            expenses.retain(|t| allocated.contains(&t.category_id));
        }

        items.push(BudgetReportItem {
            progress: BudgetProgress::compute(budget, &allocations, &expenses),
            period: ReportPeriod::new(window_start, window_end),
        });
    }

    Ok(BudgetReport {
        period: ReportPeriod::new(start, end),
        budget_count: items.len(),
        budgets: items,
        generated_at: Utc::now(),
    })
}
