//! Reduction of ledger entries into income/expense totals
//!
//! Both category lists are sorted by total descending, ties broken by
//! category id, and `income_total - expense_total == balance` always holds.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::calc::percent_of;
use crate::models::{Transaction, TransactionType};

/// Total for one category within a set of entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub income: Vec<CategoryTotal>,
    pub expense: Vec<CategoryTotal>,
}

/// Income/expense totals over a set of ledger entries
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerTotals {
    pub income_total: f64,
    pub expense_total: f64,
    pub balance: f64,
    pub transaction_count: i64,
    pub categories: CategoryBreakdown,
}

impl LedgerTotals {
    /// Reduce entries into totals and per-category breakdowns
    pub fn from_entries(entries: &[Transaction]) -> Self {
        let mut income: BTreeMap<i64, CategoryTotal> = BTreeMap::new();
        let mut expense: BTreeMap<i64, CategoryTotal> = BTreeMap::new();
        let mut income_total = 0.0;
        let mut expense_total = 0.0;

        for entry in entries {
            let bucket = match entry.kind {
                TransactionType::Income => {
                    income_total += entry.amount;
                    &mut income
                }
                TransactionType::Expense => {
                    expense_total += entry.amount;
                    &mut expense
                }
            };

            let slot = bucket.entry(entry.category_id).or_insert_with(|| {
                let (name, icon) = match &entry.category {
                    Some(c) => (c.name.clone(), c.icon.clone()),
                    None => ("Unknown".to_string(), None),
                };
                CategoryTotal {
                    id: entry.category_id,
                    name,
                    icon,
                    total: 0.0,
                }
            });
            slot.total += entry.amount;
        }

        Self {
            income_total,
            expense_total,
            balance: income_total - expense_total,
            transaction_count: entries.len() as i64,
            categories: CategoryBreakdown {
                income: sorted_by_total(income),
                expense: sorted_by_total(expense),
            },
        }
    }

    /// Share of income kept, as a percentage; 0 without income
    pub fn savings_rate(&self) -> f64 {
        if self.income_total > 0.0 {
            percent_of(self.income_total - self.expense_total, self.income_total)
        } else {
            0.0
        }
    }
}

fn sorted_by_total(totals: BTreeMap<i64, CategoryTotal>) -> Vec<CategoryTotal> {
    // BTreeMap yields ascending ids; a stable sort keeps that order for ties
    let mut list: Vec<CategoryTotal> = totals.into_values().collect();
    list.sort_by(|a, b| b.total.total_cmp(&a.total));
    list
}

/// Resolved period echoed back by the ledger summary
#[derive(Debug, Clone, Serialize)]
pub struct SummaryPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub name: String,
}

/// Headline numbers for a named period
#[derive(Debug, Clone, Serialize)]
pub struct TransactionSummary {
    pub period: SummaryPeriod,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    pub transaction_count: i64,
}
