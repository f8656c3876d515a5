//! Month-by-month evolution with trend classification

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::aggregate::LedgerTotals;
use crate::calc::{percent_of, safe_ratio};
use crate::dates::{add_months, first_day_of_month, last_day_of_month, month_label};
use crate::db::{AggregateFilter, Database};
use crate::error::Result;

/// Percentage change beyond which a trend counts as moving
const TREND_BAND: f64 = 5.0;
/// Months compared on each side of a trend (last N vs the N before)
const TREND_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    pub savings_rate: f64,
    pub transaction_count: i64,
}

impl MonthlyPoint {
    fn from_totals(month_start: NaiveDate, totals: &LedgerTotals) -> Self {
        Self {
            year: month_start.year(),
            month: month_start.month(),
            month_name: month_label(month_start),
            income: totals.income_total,
            expense: totals.expense_total,
            balance: totals.balance,
            savings_rate: totals.savings_rate(),
            transaction_count: totals.transaction_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    fn from_change(change: f64) -> Self {
        if change > TREND_BAND {
            Self::Up
        } else if change < -TREND_BAND {
            Self::Down
        } else {
            Self::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trends {
    pub income: Trend,
    pub expense: Trend,
    pub balance: Trend,
}

impl Default for Trends {
    fn default() -> Self {
        Self {
            income: Trend::Stable,
            expense: Trend::Stable,
            balance: Trend::Stable,
        }
    }
}

/// Compare the mean of the last three months with the three before
///
/// Fewer than six points, or a non-positive prior income/expense mean, or a
/// zero prior balance mean, leave the corresponding trend `stable`. Balance
/// change is measured against the absolute prior mean.
pub fn classify_trends(points: &[MonthlyPoint]) -> Trends {
    let n = points.len();
    if n < TREND_WINDOW * 2 {
        return Trends::default();
    }

    let last = &points[n - TREND_WINDOW..];
    let prev = &points[n - TREND_WINDOW * 2..n - TREND_WINDOW];
    let mean = |slice: &[MonthlyPoint], f: fn(&MonthlyPoint) -> f64| {
        safe_ratio(slice.iter().map(f).sum(), TREND_WINDOW as f64)
    };

    let mut trends = Trends::default();

    let (income_last, income_prev) = (mean(last, |p| p.income), mean(prev, |p| p.income));
    if income_prev > 0.0 {
        trends.income = Trend::from_change(percent_of(income_last - income_prev, income_prev));
    }

    let (expense_last, expense_prev) = (mean(last, |p| p.expense), mean(prev, |p| p.expense));
    if expense_prev > 0.0 {
        trends.expense = Trend::from_change(percent_of(expense_last - expense_prev, expense_prev));
    }

    let (balance_last, balance_prev) = (mean(last, |p| p.balance), mean(prev, |p| p.balance));
    if balance_prev != 0.0 {
        trends.balance =
            Trend::from_change(percent_of(balance_last - balance_prev, balance_prev.abs()));
    }

    trends
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub months: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub total_balance: f64,
    pub avg_monthly_income: f64,
    pub avg_monthly_expense: f64,
    pub best_month: Option<MonthlyPoint>,
    pub worst_month: Option<MonthlyPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub period: MonthlyPeriod,
    pub summary: MonthlySummary,
    pub trends: Trends,
    pub monthly_data: Vec<MonthlyPoint>,
    pub generated_at: DateTime<Utc>,
}

/// Per-month totals for `months_count` months starting at `start_month`
pub fn monthly_report(
    db: &Database,
    user_id: i64,
    start_month: NaiveDate,
    months_count: u32,
) -> Result<MonthlyReport> {
    let start_date = first_day_of_month(start_month);
    let end_date = last_day_of_month(add_months(start_date, months_count as i32 - 1));

    // One query for the whole window, bucketed by month below
    let entries = db.ledger_entries(user_id, &AggregateFilter::new(start_date, end_date))?;

    let mut monthly_data = Vec::with_capacity(months_count as usize);
    for offset in 0..months_count {
        let month_start = add_months(start_date, offset as i32);
        let month_end = last_day_of_month(month_start);
        let in_month: Vec<_> = entries
            .iter()
            .filter(|t| t.date >= month_start && t.date <= month_end)
            .cloned()
            .collect();
        let totals = LedgerTotals::from_entries(&in_month);
        monthly_data.push(MonthlyPoint::from_totals(month_start, &totals));
    }

    let total_income: f64 = monthly_data.iter().map(|m| m.income).sum();
    let total_expense: f64 = monthly_data.iter().map(|m| m.expense).sum();

    Ok(MonthlyReport {
        period: MonthlyPeriod {
            start_date,
            end_date,
            months: months_count,
        },
        summary: MonthlySummary {
            total_income,
            total_expense,
            total_balance: total_income - total_expense,
            avg_monthly_income: safe_ratio(total_income, months_count as f64),
            avg_monthly_expense: safe_ratio(total_expense, months_count as f64),
            best_month: extreme_month(&monthly_data, |candidate, best| candidate > best),
            worst_month: extreme_month(&monthly_data, |candidate, worst| candidate < worst),
        },
        trends: classify_trends(&monthly_data),
        monthly_data,
        generated_at: Utc::now(),
    })
}

/// First month whose balance beats every earlier one under `better`
fn extreme_month(points: &[MonthlyPoint], better: fn(f64, f64) -> bool) -> Option<MonthlyPoint> {
    let mut iter = points.iter();
    let mut pick = iter.next()?;
    for point in iter {
        if better(point.balance, pick.balance) {
            pick = point;
        }
    }
    Some(pick.clone())
}
