//! Period summary report

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::ReportPeriod;
use crate::aggregate::CategoryBreakdown;
use crate::calc::safe_ratio;
use crate::db::{AggregateFilter, Database};
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct SummaryTotals {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    pub savings_rate: f64,
}

/// Per-day averages over the inclusive period
#[derive(Debug, Clone, Serialize)]
pub struct DailyAverages {
    pub daily_income: f64,
    pub daily_expense: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub period: ReportPeriod,
    pub summary: SummaryTotals,
    pub averages: DailyAverages,
    pub categories: CategoryBreakdown,
    pub transaction_count: i64,
    pub generated_at: DateTime<Utc>,
}

/// Income, expense and category breakdown for `[start, end]`
pub fn summary_report(
    db: &Database,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<SummaryReport> {
    let totals = db.aggregate_transactions(user_id, &AggregateFilter::new(start, end))?;
    let period = ReportPeriod::new(start, end);
    let days = period.days as f64;

    Ok(SummaryReport {
        summary: SummaryTotals {
            income: totals.income_total,
            expense: totals.expense_total,
            balance: totals.balance,
            savings_rate: totals.savings_rate(),
        },
        averages: DailyAverages {
            daily_income: safe_ratio(totals.income_total, days),
            daily_expense: safe_ratio(totals.expense_total, days),
        },
        transaction_count: totals.transaction_count,
        categories: totals.categories,
        period,
        generated_at: Utc::now(),
    })
}
