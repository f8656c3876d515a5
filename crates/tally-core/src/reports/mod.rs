//! Financial report generators
//!
//! Each generator reads a user's ledger, budgets or goals and returns a
//! serializable report. `generate_report` dispatches on `ReportType` after
//! resolving the caller's parameters into concrete dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::dates::{add_months, date_range, first_day_of_month, inclusive_days, parse_date, parse_month, Period};
use crate::error::{Error, Result};
use crate::models::{ReportType, TransactionType};

mod budget;
mod category;
mod forecast;
mod goals;
mod monthly;
mod schedule;
mod summary;

pub use budget::{budget_report, BudgetReport, BudgetReportItem};
pub use category::{category_report, CategoryDetail, CategoryReport};
pub use forecast::{cash_flow_forecast, ForecastMonth, ForecastReport, RecurringItem};
pub use goals::{goals_report, GoalWithProgress, GoalsReport, GoalsSummary};
pub use monthly::{classify_trends, monthly_report, MonthlyPoint, MonthlyReport, Trend, Trends};
pub use schedule::next_run_after;
pub use summary::{summary_report, SummaryReport};

/// Default and bounds for the monthly trend report
pub const DEFAULT_MONTHS_COUNT: i64 = 12;
pub const MAX_MONTHS_COUNT: i64 = 120;
/// Default and bounds for the cash-flow forecast
pub const DEFAULT_FORECAST_MONTHS: i64 = 6;
pub const MAX_FORECAST_MONTHS: i64 = 60;

/// Caller-supplied report parameters; every field is optional
///
/// `period`, when present, overrides `start_date`/`end_date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months: Option<i64>,
}

impl ReportParameters {
    /// Inclusive date range for date-based reports
    ///
    /// Missing bounds default to the current month around `today`.
    pub fn resolve_range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        if let Some(period) = &self.period {
            return Ok(date_range(Period::parse(period), today));
        }

        let (month_start, month_end) = date_range(Period::Month, today);
        let start = match &self.start_date {
            Some(s) => parse_date(s).ok_or_else(|| Error::validation("start_date", "invalid date"))?,
            None => month_start,
        };
        let end = match &self.end_date {
            Some(s) => parse_date(s).ok_or_else(|| Error::validation("end_date", "invalid date"))?,
            None => month_end,
        };
        if end < start {
            return Err(Error::validation(
                "end_date",
                "must be on or after start_date",
            ));
        }
        Ok((start, end))
    }

    /// Entry type for the category report (expense unless stated)
    pub fn resolve_category_type(&self) -> Result<TransactionType> {
        match &self.category_type {
            Some(s) => s
                .parse()
                .map_err(|_| Error::validation("category_type", "must be 'income' or 'expense'")),
            None => Ok(TransactionType::Expense),
        }
    }

    /// First month of the monthly report; twelve months before the current one by default
    pub fn resolve_start_month(&self, today: NaiveDate) -> Result<NaiveDate> {
        match &self.start_month {
            Some(s) => parse_month(s)
                .ok_or_else(|| Error::validation("start_month", "expected YYYY-MM")),
            None => Ok(add_months(first_day_of_month(today), -12)),
        }
    }

    pub fn resolve_months_count(&self) -> Result<u32> {
        bounded(
            "months_count",
            self.months_count.unwrap_or(DEFAULT_MONTHS_COUNT),
            MAX_MONTHS_COUNT,
        )
    }

    pub fn resolve_forecast_months(&self) -> Result<u32> {
        bounded(
            "months",
            self.months.unwrap_or(DEFAULT_FORECAST_MONTHS),
            MAX_FORECAST_MONTHS,
        )
    }
}

fn bounded(field: &str, value: i64, max: i64) -> Result<u32> {
    if !(1..=max).contains(&value) {
        return Err(Error::validation(
            field,
            format!("must be between 1 and {}", max),
        ));
    }
    Ok(value as u32)
}

/// Inclusive date window echoed in date-based reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
}

impl ReportPeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            days: inclusive_days(start_date, end_date),
        }
    }
}

/// Any generated report; serialized without a wrapper tag
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Summary(SummaryReport),
    Category(CategoryReport),
    Monthly(MonthlyReport),
    Budget(BudgetReport),
    Goals(GoalsReport),
    CashFlowForecast(ForecastReport),
}

impl Report {
    pub fn report_type(&self) -> ReportType {
        match self {
            Self::Summary(_) => ReportType::Summary,
            Self::Category(_) => ReportType::Category,
            Self::Monthly(_) => ReportType::Monthly,
            Self::Budget(_) => ReportType::Budget,
            Self::Goals(_) => ReportType::Goals,
            Self::CashFlowForecast(_) => ReportType::CashFlowForecast,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        match self {
            Self::Summary(r) => r.generated_at,
            Self::Category(r) => r.generated_at,
            Self::Monthly(r) => r.generated_at,
            Self::Budget(r) => r.generated_at,
            Self::Goals(r) => r.generated_at,
            Self::CashFlowForecast(r) => r.generated_at,
        }
    }
}

/// Parse a report type token, naming the `type` field on failure
pub fn parse_report_type(token: &str) -> Result<ReportType> {
    token
        .parse()
        .map_err(|e: String| Error::validation("type", e))
}

/// Generate a report of `report_type` for `user_id` as of `today`
pub fn generate_report(
    db: &Database,
    user_id: i64,
    report_type: ReportType,
    params: &ReportParameters,
    today: NaiveDate,
) -> Result<Report> {
    let report = match report_type {
        ReportType::Summary => {
            let (start, end) = params.resolve_range(today)?;
            Report::Summary(summary_report(db, user_id, start, end)?)
        }
        ReportType::Category => {
            let (start, end) = params.resolve_range(today)?;
            let kind = params.resolve_category_type()?;
            Report::Category(category_report(db, user_id, start, end, kind)?)
        }
        ReportType::Monthly => {
            let start_month = params.resolve_start_month(today)?;
            let months_count = params.resolve_months_count()?;
            Report::Monthly(monthly_report(db, user_id, start_month, months_count)?)
        }
        ReportType::Budget => {
            let (start, end) = params.resolve_range(today)?;
            Report::Budget(budget_report(db, user_id, start, end)?)
        }
        ReportType::Goals => Report::Goals(goals_report(db, user_id, today)?),
        ReportType::CashFlowForecast => {
            let months = params.resolve_forecast_months()?;
            Report::CashFlowForecast(cash_flow_forecast(db, user_id, today, months)?)
        }
    };

    tracing::debug!(user_id, report_type = %report_type, "Generated report");
    Ok(report)
}
