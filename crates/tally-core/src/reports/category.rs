//! Spending (or income) by category

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::ReportPeriod;
use crate::calc::percent_of;
use crate::db::{AggregateFilter, Database};
use crate::error::Result;
use crate::models::{Transaction, TransactionType};

/// One category's share of the report total, with its entries
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub total: f64,
    pub percentage: f64,
    pub transaction_count: i64,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub period: ReportPeriod,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub total_amount: f64,
    pub categories: Vec<CategoryDetail>,
    pub transaction_count: i64,
    pub generated_at: DateTime<Utc>,
}

pub fn category_report(
    db: &Database,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    kind: TransactionType,
) -> Result<CategoryReport> {
    let entries = db.ledger_entries(user_id, &AggregateFilter::new(start, end).kind(kind))?;
    let transaction_count = entries.len() as i64;
    let total_amount: f64 = entries.iter().map(|t| t.amount).sum();

    let mut by_category: BTreeMap<i64, CategoryDetail> = BTreeMap::new();
    for entry in entries {
        let detail = by_category.entry(entry.category_id).or_insert_with(|| {
            let (name, icon, color) = match &entry.category {
                Some(c) => (c.name.clone(), c.icon.clone(), c.color.clone()),
                None => ("Unknown".to_string(), None, None),
            };
            CategoryDetail {
                id: entry.category_id,
                name,
                icon,
                color,
                total: 0.0,
                percentage: 0.0,
                transaction_count: 0,
                transactions: Vec::new(),
            }
        });
        detail.total += entry.amount;
        detail.transaction_count += 1;
        detail.transactions.push(entry);
    }

    let mut categories: Vec<CategoryDetail> = by_category
        .into_values()
        .map(|mut detail| {
            detail.percentage = percent_of(detail.total, total_amount);
            detail
        })
        .collect();
    categories.sort_by(|a, b| b.total.total_cmp(&a.total));

    Ok(CategoryReport {
        period: ReportPeriod::new(start, end),
        kind,
        total_amount,
        categories,
        transaction_count,
        generated_at: Utc::now(),
    })
}
