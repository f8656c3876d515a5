//! Date-range resolution for report periods
//!
//! Every range returned here is inclusive on both ends and satisfies
//! `start <= end`.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A named reporting period, resolved against a reference date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
    All,
}

impl Period {
    /// Parse a period name; unrecognized names resolve to `Month`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "day" => Self::Day,
            "week" => Self::Week,
            "quarter" => Self::Quarter,
            "year" => Self::Year,
            "all" => Self::All,
            _ => Self::Month,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolve a period into an inclusive `(start, end)` range containing `reference`
pub fn date_range(period: Period, reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    match period {
        Period::Day => (reference, reference),
        Period::Week => {
            let offset = u64::from(reference.weekday().num_days_from_monday());
            let monday = reference - Days::new(offset);
            (monday, monday + Days::new(6))
        }
        Period::Month => (
            first_day_of_month(reference),
            last_day_of_month(reference),
        ),
        Period::Quarter => {
            let first_month = (reference.month0() / 3) * 3 + 1;
            let start = NaiveDate::from_ymd_opt(reference.year(), first_month, 1)
                .unwrap_or_else(|| first_day_of_month(reference));
            (start, last_day_of_month(add_months(start, 2)))
        }
        Period::Year => {
            let start = reference.with_ordinal(1).unwrap_or(reference);
            let end = NaiveDate::from_ymd_opt(reference.year(), 12, 31).unwrap_or(reference);
            (start, end)
        }
        // Feb 29 clamps to Feb 28 ten years back
        Period::All => (add_months(reference, -120), reference),
    }
}

/// First day of the month containing `date`
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    add_months(first_day_of_month(date), 1)
        .pred_opt()
        .unwrap_or(date)
}

/// Shift `date` by whole calendar months, clamping the day to the target month's length
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// Number of days in the inclusive range
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Short month label, e.g. "Jan 2024"
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Parse a calendar date from the formats clients send
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY`, `DD-MM-YYYY`, RFC 3339 and naive ISO
/// datetimes (the time part is dropped).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    None
}

/// Parse a `YYYY-MM` month into its first day
pub fn parse_month(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_period_parse_falls_back_to_month() {
        assert_eq!(Period::parse("week"), Period::Week);
        assert_eq!(Period::parse("QUARTER"), Period::Quarter);
        assert_eq!(Period::parse("fortnight"), Period::Month);
        assert_eq!(Period::parse(""), Period::Month);
    }

    #[test]
    fn test_day_range() {
        let r = d(2024, 5, 17);
        assert_eq!(date_range(Period::Day, r), (r, r));
    }

    #[test]
    fn test_week_range_starts_monday() {
        // 2024-05-17 is a Friday
        let (start, end) = date_range(Period::Week, d(2024, 5, 17));
        assert_eq!(start, d(2024, 5, 13));
        assert_eq!(end, d(2024, 5, 19));
        assert_eq!(inclusive_days(start, end), 7);

        // A Monday is its own week start
        let (start, _) = date_range(Period::Week, d(2024, 5, 13));
        assert_eq!(start, d(2024, 5, 13));
    }

    #[test]
    fn test_month_range_lengths() {
        assert_eq!(
            date_range(Period::Month, d(2024, 2, 10)),
            (d(2024, 2, 1), d(2024, 2, 29))
        );
        assert_eq!(
            date_range(Period::Month, d(2023, 2, 10)),
            (d(2023, 2, 1), d(2023, 2, 28))
        );
        assert_eq!(
            date_range(Period::Month, d(2024, 12, 31)),
            (d(2024, 12, 1), d(2024, 12, 31))
        );
    }

    #[test]
    fn test_quarter_range() {
        assert_eq!(
            date_range(Period::Quarter, d(2024, 5, 17)),
            (d(2024, 4, 1), d(2024, 6, 30))
        );
        assert_eq!(
            date_range(Period::Quarter, d(2024, 11, 2)),
            (d(2024, 10, 1), d(2024, 12, 31))
        );
        assert_eq!(
            date_range(Period::Quarter, d(2024, 1, 1)),
            (d(2024, 1, 1), d(2024, 3, 31))
        );
    }

    #[test]
    fn test_year_range() {
        let (start, end) = date_range(Period::Year, d(2024, 7, 4));
        assert_eq!(start, d(2024, 1, 1));
        assert_eq!(end, d(2024, 12, 31));
        assert_eq!(inclusive_days(start, end), 366);
    }

    #[test]
    fn test_all_range_clamps_leap_day() {
        assert_eq!(
            date_range(Period::All, d(2024, 2, 29)),
            (d(2014, 2, 28), d(2024, 2, 29))
        );
        assert_eq!(
            date_range(Period::All, d(2024, 6, 15)),
            (d(2014, 6, 15), d(2024, 6, 15))
        );
    }

    #[test]
    fn test_every_range_contains_reference() {
        let mut reference = d(2023, 12, 25);
        for _ in 0..400 {
            for period in [
                Period::Day,
                Period::Week,
                Period::Month,
                Period::Quarter,
                Period::Year,
                Period::All,
            ] {
                let (start, end) = date_range(period, reference);
                assert!(start <= end, "{period} at {reference}");
                assert!(start <= reference && reference <= end);
            }
            reference = reference.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_add_months_clamps_day() {
        assert_eq!(add_months(d(2024, 1, 31), 1), d(2024, 2, 29));
        assert_eq!(add_months(d(2024, 3, 31), -1), d(2024, 2, 29));
        assert_eq!(add_months(d(2024, 11, 15), 3), d(2025, 2, 15));
        assert_eq!(add_months(d(2024, 1, 15), -12), d(2023, 1, 15));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-05"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("05/03/2024"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("05-03-2024"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T10:30:00Z"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T10:30:00.123"), Some(d(2024, 3, 5)));
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-02"), Some(d(2024, 2, 1)));
        assert_eq!(parse_month("2024-13"), None);
        assert_eq!(parse_month("feb"), None);
    }

    #[test]
    fn test_month_label() {
        assert_eq!(month_label(d(2024, 1, 20)), "Jan 2024");
    }
}
