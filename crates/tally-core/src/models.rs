//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// A registered user; every other entity is scoped to one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Direction of money flow for ledger entries and categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Categories ==========

/// A spending or income category
///
/// Default categories have no owner and are visible to every user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub user_id: Option<i64>,
    pub is_default: bool,
}

/// The slice of a category embedded in other payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: TransactionType,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

// ========== Ledger entries ==========

/// A single income or expense record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub category_id: i64,
    pub category: Option<CategoryRef>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub category_id: i64,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<String>,
}

/// Partial update of a ledger entry; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    pub kind: Option<TransactionType>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub notes: Option<Option<String>>,
    pub is_recurring: Option<bool>,
    pub recurrence_pattern: Option<Option<String>>,
}

/// One page of a filtered ledger listing
#[derive(Debug, Clone, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub pages: i64,
}

// ========== Budgets ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A budget together with its category allocations
#[derive(Debug, Clone, Serialize)]
pub struct BudgetDetail {
    #[serde(flatten)]
    pub budget: Budget,
    pub categories: Vec<BudgetAllocation>,
}

/// A sub-amount of a budget earmarked for one expense category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub id: i64,
    pub budget_id: i64,
    pub category: CategoryRef,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    pub category_id: i64,
    pub amount: f64,
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub name: String,
    pub amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: Option<String>,
    pub categories: Vec<AllocationInput>,
}

/// Partial budget update; `categories` replaces the whole allocation list
#[derive(Debug, Clone, Default)]
pub struct BudgetUpdate {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub categories: Option<Vec<AllocationInput>>,
}

// ========== Goals ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: Option<NaiveDate>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
    pub is_active: bool,
    pub is_completed: bool,
    pub completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub deadline: Option<NaiveDate>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalUpdate {
    pub name: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub deadline: Option<Option<NaiveDate>>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// An append-only deposit towards a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalContribution {
    pub id: i64,
    pub goal_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContribution {
    pub amount: f64,
    /// Effective date; today when absent
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// The goal as it stands after a contribution, plus the stored contribution
#[derive(Debug, Clone, Serialize)]
pub struct ContributionResult {
    pub goal: Goal,
    pub contribution: GoalContribution,
}

// ========== Reports ==========

/// Kinds of generated report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Summary,
    Category,
    Monthly,
    Budget,
    Goals,
    CashFlowForecast,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Category => "category",
            Self::Monthly => "monthly",
            Self::Budget => "budget",
            Self::Goals => "goals",
            Self::CashFlowForecast => "cash_flow_forecast",
        }
    }

    pub fn all() -> &'static [ReportType] {
        &[
            Self::Summary,
            Self::Category,
            Self::Monthly,
            Self::Budget,
            Self::Goals,
            Self::CashFlowForecast,
        ]
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "category" => Ok(Self::Category),
            "monthly" => Ok(Self::Monthly),
            "budget" => Ok(Self::Budget),
            "goals" => Ok(Self::Goals),
            "cash_flow_forecast" => Ok(Self::CashFlowForecast),
            _ => Err(format!("Unknown report type: {}", s)),
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted report; `data` is the generated JSON exactly as it was stored
#[derive(Debug, Clone, Serialize)]
pub struct SavedReport {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub parameters: serde_json::Value,
    pub data: Box<RawValue>,
    pub generated_at: DateTime<Utc>,
}

/// Listing row for saved reports (data omitted)
#[derive(Debug, Clone, Serialize)]
pub struct SavedReportSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub parameters: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Email,
    Download,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Download => "download",
        }
    }
}

impl std::str::FromStr for DeliveryMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "download" => Ok(Self::Download),
            _ => Err(format!("Unknown delivery method: {}", s)),
        }
    }
}

/// A stored request to generate a report periodically
#[derive(Debug, Clone, Serialize)]
pub struct ReportSchedule {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub report_type: ReportType,
    pub frequency: Frequency,
    pub delivery_method: DeliveryMethod,
    pub email: Option<String>,
    pub parameters: serde_json::Value,
    pub is_active: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub name: String,
    pub report_type: ReportType,
    pub frequency: Frequency,
    pub delivery_method: DeliveryMethod,
    pub email: Option<String>,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleUpdate {
    pub name: Option<String>,
    pub report_type: Option<ReportType>,
    pub frequency: Option<Frequency>,
    pub delivery_method: Option<DeliveryMethod>,
    pub email: Option<Option<String>>,
    pub parameters: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}
