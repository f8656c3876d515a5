//! Transaction filter builder for constructing dynamic SQL queries
//!
//! Builds the WHERE and ORDER BY components shared by the ledger listing
//! and its count query. Every filter is scoped to one user.

use chrono::NaiveDate;

use crate::models::TransactionType;

/// Builder for ledger listing filters
///
/// The lifetime `'query` covers borrowed filter inputs (search text, sort key).
pub struct TransactionFilter<'query> {
    pub user_id: i64,
    pub kind: Option<TransactionType>,
    pub category_id: Option<i64>,
    pub date_range: (Option<NaiveDate>, Option<NaiveDate>),
    pub amount_range: (Option<f64>, Option<f64>),
    pub search: Option<&'query str>,
    pub is_recurring: Option<bool>,
    pub sort: Option<&'query str>,
}

/// Result of building a filter - contains SQL components and parameters
pub struct FilterResult {
    /// WHERE clause including "WHERE" keyword
    pub where_clause: String,
    /// ORDER BY clause including "ORDER BY" keyword
    pub order_clause: String,
    /// Parameters for the query (boxed for rusqlite compatibility)
    pub params: Vec<Box<dyn rusqlite::ToSql>>,
}

impl<'query> TransactionFilter<'query> {
    /// Create a filter over one user's ledger
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            kind: None,
            category_id: None,
            date_range: (None, None),
            amount_range: (None, None),
            search: None,
            is_recurring: None,
            sort: None,
        }
    }

    /// Set income/expense filter
    pub fn kind(mut self, kind: Option<TransactionType>) -> Self {
        self.kind = kind;
        self
    }

    pub fn category_id(mut self, id: Option<i64>) -> Self {
        self.category_id = id;
        self
    }

    /// Set inclusive date bounds; either side may be open
    pub fn date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_range = (from, to);
        self
    }

    /// Set inclusive amount bounds; either side may be open
    pub fn amount_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.amount_range = (min, max);
        self
    }

    /// Set search query (matches description and notes)
    pub fn search(mut self, query: Option<&'query str>) -> Self {
        self.search = query;
        self
    }

    pub fn is_recurring(mut self, value: Option<bool>) -> Self {
        self.is_recurring = value;
        self
    }

    /// Set sort key: `date|amount|description|created_at`, `-` prefix for descending
    pub fn sort(mut self, sort: Option<&'query str>) -> Self {
        self.sort = sort;
        self
    }

    /// Build the filter components
    pub fn build(self) -> FilterResult {
        let mut conditions = vec!["t.user_id = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(self.user_id)];

        if let Some(kind) = self.kind {
            conditions.push("t.type = ?".to_string());
            params.push(Box::new(kind.as_str()));
        }

        if let Some(cid) = self.category_id {
            conditions.push("t.category_id = ?".to_string());
            params.push(Box::new(cid));
        }

        let (from_date, to_date) = self.date_range;
        if let Some(from) = from_date {
            conditions.push("t.date >= ?".to_string());
            params.push(Box::new(from.to_string()));
        }
        if let Some(to) = to_date {
            conditions.push("t.date <= ?".to_string());
            params.push(Box::new(to.to_string()));
        }

        let (min_amount, max_amount) = self.amount_range;
        if let Some(min) = min_amount {
            conditions.push("t.amount >= ?".to_string());
            params.push(Box::new(min));
        }
        if let Some(max) = max_amount {
            conditions.push("t.amount <= ?".to_string());
            params.push(Box::new(max));
        }

        // Search filter (description and notes)
        if let Some(q) = self.search {
            if !q.trim().is_empty() {
                conditions.push(
                    "(t.description LIKE ? COLLATE NOCASE OR t.notes LIKE ? COLLATE NOCASE)"
                        .to_string(),
                );
                let pattern = format!("%{}%", q.trim());
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern));
            }
        }

        if let Some(recurring) = self.is_recurring {
            conditions.push("t.is_recurring = ?".to_string());
            params.push(Box::new(recurring));
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        // Build ORDER BY clause
        let sort = self.sort.map(str::trim).unwrap_or("-date");
        let (descending, key) = match sort.strip_prefix('-') {
            Some(key) => (true, key),
            None => (false, sort),
        };
        let order_column = match key {
            "amount" => "t.amount",
            "description" => "t.description",
            "created_at" => "t.created_at",
            _ => "t.date",
        };
        let order_dir = if descending { "DESC" } else { "ASC" };
        let order_clause = format!("ORDER BY {} {}, t.id {}", order_column, order_dir, order_dir);

        FilterResult {
            where_clause,
            order_clause,
            params,
        }
    }
}

impl FilterResult {
    /// Build a COUNT query
    pub fn build_count_query(&self) -> String {
        format!("SELECT COUNT(*) FROM transactions t {}", self.where_clause)
    }

    /// Get parameter references for query execution
    pub fn params_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }

    /// Take the parameter vector to append pagination params
    pub fn into_params(self) -> Vec<Box<dyn rusqlite::ToSql>> {
        self.params
    }
}
