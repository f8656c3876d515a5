//! Saved reports and report schedules

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use serde_json::value::RawValue;
use tracing::debug;

use super::{format_datetime, parse_column, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    DeliveryMethod, NewSchedule, ReportSchedule, ReportType, SavedReport, SavedReportSummary,
    ScheduleUpdate,
};
use crate::reports::next_run_after;
use crate::validate;

const SELECT_SCHEDULE: &str = r#"
    SELECT id, user_id, name, report_type, frequency, delivery_method, email, parameters,
           is_active, last_run, next_run, created_at
    FROM report_schedules
"#;

fn json_column(idx: usize, value: &str) -> rusqlite::Result<serde_json::Value> {
    serde_json::from_str(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl Database {
    /// Store a generated report
    ///
    /// `data` must be a JSON document; it is stored as given so that a later
    /// fetch returns the same bytes. `generated_at` is the report's own
    /// generation time.
    pub fn save_report(
        &self,
        user_id: i64,
        name: &str,
        report_type: ReportType,
        parameters: &serde_json::Value,
        data: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<SavedReport> {
        let name = validate::sanitize_text(name, 100);
        validate::text_length("name", &name, 1, 100)?;
        RawValue::from_string(data.to_string())
            .map_err(|_| Error::InvalidData("report data is not valid JSON".to_string()))?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO reports (user_id, name, type, parameters, data, generated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                name,
                report_type.as_str(),
                parameters.to_string(),
                data,
                format_datetime(&generated_at),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(user_id, report_id = id, report_type = %report_type, "Saved report");

        self.get_report(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("report {}", id)))
    }

    /// Saved reports without their data, newest first
    pub fn list_reports(&self, user_id: i64, limit: i64) -> Result<Vec<SavedReportSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, type, parameters, generated_at
            FROM reports
            WHERE user_id = ?
            ORDER BY generated_at DESC, id DESC
            LIMIT ?
            "#,
        )?;
        let reports = stmt
            .query_map(params![user_id, limit.max(1)], |row| {
                let report_type: String = row.get(2)?;
                let parameters: String = row.get(3)?;
                let generated_at: String = row.get(4)?;
                Ok(SavedReportSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    report_type: parse_column(2, &report_type)?,
                    parameters: json_column(3, &parameters)?,
                    generated_at: parse_datetime(&generated_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reports)
    }

    pub fn get_report(&self, user_id: i64, id: i64) -> Result<Option<SavedReport>> {
        let conn = self.conn()?;
        let report = conn
            .query_row(
                r#"
                SELECT id, user_id, name, type, parameters, data, generated_at
                FROM reports
                WHERE id = ? AND user_id = ?
                "#,
                params![id, user_id],
                Self::row_to_saved_report,
            )
            .optional()?;
        Ok(report)
    }

    pub fn delete_report(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM reports WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("report {}", id)));
        }
        debug!(user_id, report_id = id, "Deleted report");
        Ok(())
    }

    /// Store a schedule; its first run is one period after `now`
    pub fn create_report_schedule(
        &self,
        user_id: i64,
        new: &NewSchedule,
        now: DateTime<Utc>,
    ) -> Result<ReportSchedule> {
        validate::text_length("name", &new.name, 3, 100)?;
        check_delivery(new.delivery_method, new.email.as_deref())?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO report_schedules (user_id, name, report_type, frequency, delivery_method,
                                          email, parameters, next_run)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                new.name,
                new.report_type.as_str(),
                new.frequency.as_str(),
                new.delivery_method.as_str(),
                new.email,
                new.parameters.to_string(),
                format_datetime(&next_run_after(new.frequency, now)),
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(user_id, schedule_id = id, frequency = %new.frequency, "Created report schedule");

        self.get_report_schedule(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("schedule {}", id)))
    }

    /// Active schedules, soonest next run first
    pub fn list_report_schedules(&self, user_id: i64) -> Result<Vec<ReportSchedule>> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE user_id = ? AND is_active = 1 ORDER BY next_run, id",
            SELECT_SCHEDULE
        );
        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map(params![user_id], Self::row_to_schedule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(schedules)
    }

    pub fn get_report_schedule(&self, user_id: i64, id: i64) -> Result<Option<ReportSchedule>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE id = ? AND user_id = ?", SELECT_SCHEDULE);
        let schedule = conn
            .query_row(&sql, params![id, user_id], Self::row_to_schedule)
            .optional()?;
        Ok(schedule)
    }

    /// Apply a partial update; a changed frequency reschedules from `now`
    pub fn update_report_schedule(
        &self,
        user_id: i64,
        id: i64,
        update: &ScheduleUpdate,
        now: DateTime<Utc>,
    ) -> Result<ReportSchedule> {
        let existing = self
            .get_report_schedule(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("schedule {}", id)))?;

        let name = update.name.clone().unwrap_or(existing.name);
        let report_type = update.report_type.unwrap_or(existing.report_type);
        let frequency = update.frequency.unwrap_or(existing.frequency);
        let delivery_method = update.delivery_method.unwrap_or(existing.delivery_method);
        let email = update.email.clone().unwrap_or(existing.email);
        let parameters = update.parameters.clone().unwrap_or(existing.parameters);
        let is_active = update.is_active.unwrap_or(existing.is_active);

        validate::text_length("name", &name, 3, 100)?;
        check_delivery(delivery_method, email.as_deref())?;

        let next_run = if frequency != existing.frequency {
            Some(next_run_after(frequency, now))
        } else {
            existing.next_run
        };

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE report_schedules
            SET name = ?, report_type = ?, frequency = ?, delivery_method = ?, email = ?,
                parameters = ?, is_active = ?, next_run = ?
            WHERE id = ? AND user_id = ?
            "#,
            params![
                name,
                report_type.as_str(),
                frequency.as_str(),
                delivery_method.as_str(),
                email,
                parameters.to_string(),
                is_active,
                next_run.as_ref().map(format_datetime),
                id,
                user_id,
            ],
        )?;

        self.get_report_schedule(user_id, id)?
            .ok_or_else(|| Error::NotFound(format!("schedule {}", id)))
    }

    pub fn delete_report_schedule(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM report_schedules WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("schedule {}", id)));
        }
        Ok(())
    }

    fn row_to_saved_report(row: &rusqlite::Row) -> rusqlite::Result<SavedReport> {
        let report_type: String = row.get(3)?;
        let parameters: String = row.get(4)?;
        let data: String = row.get(5)?;
        let generated_at: String = row.get(6)?;

        Ok(SavedReport {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            report_type: parse_column(3, &report_type)?,
            parameters: json_column(4, &parameters)?,
            data: RawValue::from_string(data).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
            })?,
            generated_at: parse_datetime(&generated_at),
        })
    }

    fn row_to_schedule(row: &rusqlite::Row) -> rusqlite::Result<ReportSchedule> {
        let report_type: String = row.get(3)?;
        let frequency: String = row.get(4)?;
        let delivery_method: String = row.get(5)?;
        let parameters: String = row.get(7)?;
        let last_run: Option<String> = row.get(9)?;
        let next_run: Option<String> = row.get(10)?;
        let created_at: String = row.get(11)?;

        Ok(ReportSchedule {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            report_type: parse_column(3, &report_type)?,
            frequency: parse_column(4, &frequency)?,
            delivery_method: parse_column(5, &delivery_method)?,
            email: row.get(6)?,
            parameters: json_column(7, &parameters)?,
            is_active: row.get(8)?,
            last_run: last_run.as_deref().map(parse_datetime),
            next_run: next_run.as_deref().map(parse_datetime),
            created_at: parse_datetime(&created_at),
        })
    }
}

/// Email delivery needs a valid address
fn check_delivery(method: DeliveryMethod, email: Option<&str>) -> Result<()> {
    match (method, email) {
        (DeliveryMethod::Email, Some(address)) => validate::email(address),
        (DeliveryMethod::Email, None) => Err(Error::validation(
            "email",
            "is required for email delivery",
        )),
        (DeliveryMethod::Download, _) => Ok(()),
    }
}
