use chrono::{DateTime, Datelike, Duration, Months, SubsecRound, Utc};

use crate::models::Frequency;

/// Last day of month a monthly schedule may land on
const MAX_MONTHLY_DAY: u32 = 28;

/// Next time a schedule of `frequency` fires after `now`
///
/// Monthly schedules move to the following month on the same day, capped at
/// the 28th, keeping the time of day.
pub fn next_run_after(frequency: Frequency, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(0);
    match frequency {
        Frequency::Daily => now + Duration::days(1),
        Frequency::Weekly => now + Duration::days(7),
        Frequency::Monthly => {
            let capped = now.with_day(now.day().min(MAX_MONTHLY_DAY)).unwrap_or(now);
            capped.checked_add_months(Months::new(1)).unwrap_or(capped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_daily_and_weekly() {
        let now = at(2024, 2, 28, 9, 30);
        assert_eq!(next_run_after(Frequency::Daily, now), at(2024, 2, 29, 9, 30));
        assert_eq!(next_run_after(Frequency::Weekly, now), at(2024, 3, 6, 9, 30));
    }

    #[test]
    fn test_monthly_caps_day_at_28() {
        assert_eq!(
            next_run_after(Frequency::Monthly, at(2024, 1, 31, 8, 0)),
            at(2024, 2, 28, 8, 0)
        );
        assert_eq!(
            next_run_after(Frequency::Monthly, at(2024, 12, 10, 8, 0)),
            at(2025, 1, 10, 8, 0)
        );
    }

    #[test]
    fn test_subseconds_dropped() {
        let now = at(2024, 5, 1, 0, 0) + Duration::milliseconds(750);
        assert_eq!(next_run_after(Frequency::Daily, now), at(2024, 5, 2, 0, 0));
    }
}
