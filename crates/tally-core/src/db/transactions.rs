//! Ledger entry operations and aggregation

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{parse_column, parse_date_column, parse_datetime, Database, TransactionFilter};
use crate::aggregate::{LedgerTotals, SummaryPeriod, TransactionSummary};
use crate::dates::{date_range, Period};
use crate::error::{Error, Result};
use crate::models::{
    CategoryRef, NewTransaction, Transaction, TransactionPage, TransactionType, TransactionUpdate,
};
use crate::validate;

const SELECT_TRANSACTION: &str = r#"
    SELECT t.id, t.user_id, t.type, t.description, t.amount, t.date, t.category_id,
           t.notes, t.is_recurring, t.recurrence_pattern, t.created_at, t.updated_at,
           c.name, c.icon, c.color
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id
"#;

/// Maximum page size for ledger listings
pub const MAX_PER_PAGE: i64 = 100;

/// Selection of ledger entries to aggregate
#[derive(Debug, Clone)]
pub struct AggregateFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kind: Option<TransactionType>,
    pub category_id: Option<i64>,
}

impl AggregateFilter {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            kind: None,
            category_id: None,
        }
    }

    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

impl Database {
    /// Record a ledger entry
    pub fn create_transaction(&self, user_id: i64, new: &NewTransaction) -> Result<Transaction> {
        self.check_entry(user_id, new.kind, &new.description, new.amount, new.category_id)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions (user_id, type, description, amount, date, category_id,
                                      notes, is_recurring, recurrence_pattern)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                new.kind.as_str(),
                new.description,
                new.amount,
                new.date.to_string(),
                new.category_id,
                new.notes,
                new.is_recurring,
                new.recurrence_pattern,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(user_id, transaction_id = id, "Created transaction");

        self.get_transaction(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
    }

    /// Get a single ledger entry owned by `user_id`
    pub fn get_transaction(&self, user_id: i64, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE t.id = ? AND t.user_id = ?", SELECT_TRANSACTION);
        let transaction = conn
            .query_row(&sql, params![id, user_id], Self::row_to_transaction)
            .optional()?;
        Ok(transaction)
    }

    /// Filtered, sorted, paginated ledger listing
    ///
    /// `page` starts at 1; `per_page` is clamped to `1..=MAX_PER_PAGE`.
    pub fn list_transactions(
        &self,
        filter: TransactionFilter<'_>,
        page: i64,
        per_page: i64,
    ) -> Result<TransactionPage> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| Error::validation("page", "page is out of range"))?;
        let conn = self.conn()?;

        let filter = filter.build();
        let total: i64 = conn.query_row(
            &filter.build_count_query(),
            filter.params_refs().as_slice(),
            |row| row.get(0),
        )?;

        let sql = format!(
            "{} {} {} LIMIT ? OFFSET ?",
            SELECT_TRANSACTION, filter.where_clause, filter.order_clause
        );

        // Add pagination params
        let mut params = filter.into_params();
        params.push(Box::new(per_page));
        params.push(Box::new(offset));

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let transactions = stmt
            .query_map(params_refs.as_slice(), Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(TransactionPage {
            transactions,
            total,
            page,
            per_page,
            pages: (total + per_page - 1) / per_page,
        })
    }

    /// Apply a partial update to a ledger entry
    pub fn update_transaction(
        &self,
        user_id: i64,
        id: i64,
        update: &TransactionUpdate,
    ) -> Result<Transaction> {
        let existing = self
            .get_transaction(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;

        let kind = update.kind.unwrap_or(existing.kind);
        let description = update.description.clone().unwrap_or(existing.description);
        let amount = update.amount.unwrap_or(existing.amount);
        let date = update.date.unwrap_or(existing.date);
        let category_id = update.category_id.unwrap_or(existing.category_id);
        let notes = update.notes.clone().unwrap_or(existing.notes);
        let is_recurring = update.is_recurring.unwrap_or(existing.is_recurring);
        let recurrence_pattern = update
            .recurrence_pattern
            .clone()
            .unwrap_or(existing.recurrence_pattern);

        self.check_entry(user_id, kind, &description, amount, category_id)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE transactions
            SET type = ?, description = ?, amount = ?, date = ?, category_id = ?, notes = ?,
                is_recurring = ?, recurrence_pattern = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND user_id = ?
            "#,
            params![
                kind.as_str(),
                description,
                amount,
                date.to_string(),
                category_id,
                notes,
                is_recurring,
                recurrence_pattern,
                id,
                user_id,
            ],
        )?;

        self.get_transaction(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))
    }

    pub fn delete_transaction(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM transactions WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    /// Ledger entries matching an aggregate filter, oldest first
    pub fn ledger_entries(&self, user_id: i64, filter: &AggregateFilter) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            r#"
            {}
            WHERE t.user_id = ?1 AND t.date >= ?2 AND t.date <= ?3
              AND (?4 IS NULL OR t.type = ?4)
              AND (?5 IS NULL OR t.category_id = ?5)
            ORDER BY t.date, t.id
            "#,
            SELECT_TRANSACTION
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(
                params![
                    user_id,
                    filter.start.to_string(),
                    filter.end.to_string(),
                    filter.kind.map(|k| k.as_str()),
                    filter.category_id,
                ],
                Self::row_to_transaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Totals and per-category breakdown for the selected entries
    pub fn aggregate_transactions(
        &self,
        user_id: i64,
        filter: &AggregateFilter,
    ) -> Result<LedgerTotals> {
        let entries = self.ledger_entries(user_id, filter)?;
        Ok(LedgerTotals::from_entries(&entries))
    }

    /// Entries flagged as recurring, in insertion order
    pub fn recurring_transactions(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE t.user_id = ? AND t.is_recurring = 1 ORDER BY t.id",
            SELECT_TRANSACTION
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![user_id], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Income, expense and balance for a named period around `today`
    pub fn transactions_summary(
        &self,
        user_id: i64,
        period: Period,
        today: NaiveDate,
    ) -> Result<TransactionSummary> {
        let (start, end) = date_range(period, today);
        let totals = self.aggregate_transactions(user_id, &AggregateFilter::new(start, end))?;

        Ok(TransactionSummary {
            period: SummaryPeriod {
                start_date: start,
                end_date: end,
                name: period.as_str().to_string(),
            },
            income: totals.income_total,
            expense: totals.expense_total,
            balance: totals.balance,
            transaction_count: totals.transaction_count,
        })
    }

    /// Validate an entry's fields and that its category fits
    fn check_entry(
        &self,
        user_id: i64,
        kind: TransactionType,
        description: &str,
        amount: f64,
        category_id: i64,
    ) -> Result<()> {
        validate::text_length("description", description, 3, 200)?;
        validate::min_amount("amount", amount, validate::MIN_AMOUNT)?;

        let category = self
            .get_accessible_category(user_id, category_id)?
            .ok_or_else(|| Error::validation("category_id", "category not found"))?;
        if category.kind != kind {
            return Err(Error::validation(
                "category_id",
                format!("category type '{}' does not match entry type '{}'", category.kind, kind),
            ));
        }
        Ok(())
    }

    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let kind_str: String = row.get(2)?;
        let date_str: String = row.get(5)?;
        let category_id: i64 = row.get(6)?;
        let recurring: i64 = row.get(8)?;
        let created_at_str: String = row.get(10)?;
        let updated_at_str: String = row.get(11)?;
        let category_name: Option<String> = row.get(12)?;

        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: parse_column(2, &kind_str)?,
            description: row.get(3)?,
            amount: row.get(4)?,
            date: parse_date_column(5, &date_str)?,
            category_id,
            category: match category_name {
                Some(name) => Some(CategoryRef {
                    id: category_id,
                    name,
                    icon: row.get(13)?,
                    color: row.get(14)?,
                }),
                None => None,
            },
            notes: row.get(7)?,
            is_recurring: recurring != 0,
            recurrence_pattern: row.get(9)?,
            created_at: parse_datetime(&created_at_str),
            updated_at: parse_datetime(&updated_at_str),
        })
    }
}
