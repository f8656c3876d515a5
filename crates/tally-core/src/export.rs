//! Export of saved reports as JSON or CSV
//!
//! JSON exports the stored document pretty-printed. CSV only has a tabular
//! shape for summary (expense categories) and monthly (one row per month)
//! reports; every other type exports a single identification row.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{ReportType, SavedReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// An exported report ready to be sent as a download
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Expense category row of a summary report
#[derive(Debug, Deserialize, Serialize)]
struct CategoryRow {
    id: i64,
    name: String,
    icon: Option<String>,
    total: f64,
}

#[derive(Debug, Deserialize)]
struct SummaryCategories {
    #[serde(default)]
    expense: Vec<CategoryRow>,
}

#[derive(Debug, Deserialize)]
struct SummaryData {
    categories: SummaryCategories,
}

#[derive(Debug, Deserialize, Serialize)]
struct MonthRow {
    year: i32,
    month: u32,
    month_name: String,
    income: f64,
    expense: f64,
    balance: f64,
    savings_rate: f64,
    transaction_count: i64,
}

#[derive(Debug, Deserialize)]
struct MonthlyData {
    #[serde(default)]
    monthly_data: Vec<MonthRow>,
}

pub fn export_report(report: &SavedReport, format: ExportFormat) -> Result<ExportedReport> {
    let bytes = match format {
        ExportFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(report.data.get())?;
            serde_json::to_vec_pretty(&value)?
        }
        ExportFormat::Csv => report_csv(report)?,
    };

    Ok(ExportedReport {
        bytes,
        content_type: format.content_type(),
        filename: format!("{}.{}", file_stem(&report.name), format.extension()),
    })
}

fn report_csv(report: &SavedReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    match report.report_type {
        ReportType::Summary => {
            let data: SummaryData = serde_json::from_str(report.data.get())?;
            if data.categories.expense.is_empty() {
                writer.write_record(["id", "name", "icon", "total"])?;
            }
            for row in &data.categories.expense {
                writer.serialize(row)?;
            }
        }
        ReportType::Monthly => {
            let data: MonthlyData = serde_json::from_str(report.data.get())?;
            if data.monthly_data.is_empty() {
                writer.write_record([
                    "year",
                    "month",
                    "month_name",
                    "income",
                    "expense",
                    "balance",
                    "savings_rate",
                    "transaction_count",
                ])?;
            }
            for row in &data.monthly_data {
                writer.serialize(row)?;
            }
        }
        _ => {
            writer.write_record(["Report Type", "Generated At"])?;
            writer.write_record([
                report.report_type.as_str().to_string(),
                report.generated_at.to_rfc3339(),
            ])?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// File name safe version of a report name
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "report".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::value::RawValue;

    fn saved(report_type: ReportType, data: &str) -> SavedReport {
        SavedReport {
            id: 7,
            user_id: 1,
            name: "June summary".to_string(),
            report_type,
            parameters: serde_json::json!({}),
            data: RawValue::from_string(data.to_string()).unwrap(),
            generated_at: Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_summary_csv_lists_expense_categories() {
        let report = saved(
            ReportType::Summary,
            r#"{"categories":{"income":[{"id":1,"name":"Salary","icon":null,"total":3000.0}],
                "expense":[{"id":5,"name":"Housing","icon":"home","total":1200.0},
                           {"id":6,"name":"Food, groceries","icon":null,"total":300.5}]}}"#,
        );
        let exported = export_report(&report, ExportFormat::Csv).unwrap();
        let text = String::from_utf8(exported.bytes).unwrap();

        assert_eq!(
            text,
            "id,name,icon,total\n5,Housing,home,1200.0\n6,\"Food, groceries\",,300.5\n"
        );
        assert_eq!(exported.content_type, "text/csv");
        assert_eq!(exported.filename, "June_summary.csv");
    }

    #[test]
    fn test_monthly_csv_one_row_per_month() {
        let report = saved(
            ReportType::Monthly,
            r#"{"monthly_data":[
                {"year":2024,"month":1,"month_name":"Jan 2024","income":100.0,"expense":50.0,
                 "balance":50.0,"savings_rate":50.0,"transaction_count":2},
                {"year":2024,"month":2,"month_name":"Feb 2024","income":0.0,"expense":0.0,
                 "balance":0.0,"savings_rate":0.0,"transaction_count":0}]}"#,
        );
        let text = String::from_utf8(export_report(&report, ExportFormat::Csv).unwrap().bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "year,month,month_name,income,expense,balance,savings_rate,transaction_count"
        );
        assert_eq!(lines[1], "2024,1,Jan 2024,100.0,50.0,50.0,50.0,2");
    }

    #[test]
    fn test_other_types_export_identification_row() {
        let report = saved(ReportType::Goals, r#"{"goals":[]}"#);
        let text = String::from_utf8(export_report(&report, ExportFormat::Csv).unwrap().bytes).unwrap();
        assert_eq!(text, "Report Type,Generated At\ngoals,2024-06-30T12:00:00+00:00\n");
    }

    #[test]
    fn test_json_export_is_pretty() {
        let report = saved(ReportType::Goals, r#"{"goals":[],"summary":{"total_goals":0}}"#);
        let exported = export_report(&report, ExportFormat::Json).unwrap();
        let text = String::from_utf8(exported.bytes).unwrap();

        assert!(text.contains("\n  \"goals\": []"));
        assert_eq!(exported.content_type, "application/json");
        assert_eq!(exported.filename, "June_summary.json");
    }
}
