//! Report command implementations

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tally_core::db::Database;
use tally_core::reports::{generate_report, parse_report_type, ReportParameters};
use tally_core::{export_report, ExportFormat};
use tracing::{debug, info};

/// Report options collected from the command line
#[derive(Debug, Default)]
pub struct ReportArgs {
    pub report_type: String,
    pub period: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub category_type: Option<String>,
    pub start_month: Option<String>,
    pub months: Option<i64>,
    pub save: Option<String>,
}

impl ReportArgs {
    /// Report parameters as the API would receive them
    ///
    /// `--months` feeds both the monthly length and the forecast horizon;
    /// each generator only reads its own field.
    pub fn parameters(&self) -> ReportParameters {
        ReportParameters {
            period: self.period.clone(),
            start_date: self.from.clone(),
            end_date: self.to.clone(),
            category_type: self.category_type.clone(),
            start_month: self.start_month.clone(),
            months_count: self.months,
            months: self.months,
        }
    }
}

/// Generate a report for `user_id`, optionally saving it, and return its JSON
pub fn render_report(db: &Database, user_id: i64, args: &ReportArgs) -> Result<String> {
    db.get_user(user_id)?
        .with_context(|| format!("User {} not found", user_id))?;

    let report_type = parse_report_type(&args.report_type)?;
    let params = args.parameters();
    let report = generate_report(db, user_id, report_type, &params, Utc::now().date_naive())?;

    let json = serde_json::to_string_pretty(&report)?;
    debug!(user_id, report_type = %report_type, bytes = json.len(), "Rendered report");

    if let Some(name) = &args.save {
        let parameters = serde_json::to_value(&params)?;
        let data = serde_json::to_string(&report)?;
        let saved = db
            .save_report(user_id, name, report_type, &parameters, &data, report.generated_at())
            .context("Failed to save report")?;
        info!(user_id, report_id = saved.id, "Saved report");
        eprintln!("💾 Saved as report {} ({})", saved.id, saved.name);
    }

    Ok(json)
}

pub fn cmd_report(db: &Database, user_id: i64, args: &ReportArgs) -> Result<()> {
    let json = render_report(db, user_id, args)?;
    println!("{}", json);
    Ok(())
}

pub fn cmd_export(
    db: &Database,
    user_id: i64,
    id: i64,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let format: ExportFormat = format.parse().map_err(anyhow::Error::msg)?;
    let report = db
        .get_report(user_id, id)?
        .with_context(|| format!("Report {} not found", id))?;
    let exported = export_report(&report, format)?;

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| exported.filename.clone().into());
    std::fs::write(&path, &exported.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "📄 Exported report {} to {} ({} bytes)",
        id,
        path.display(),
        exported.bytes.len()
    );
    Ok(())
}
