//! Ratio helpers shared by every percentage, rate and average in the crate
//!
//! A zero denominator yields `0.0`, never NaN or infinity.

/// `numerator / denominator`, or `0.0` when the denominator is zero
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// `numerator` as a percentage of `denominator` (unclamped)
pub fn percent_of(numerator: f64, denominator: f64) -> f64 {
    safe_ratio(numerator, denominator) * 100.0
}

/// Percentage clamped to `[0, 100]`
pub fn clamped_percent(numerator: f64, denominator: f64) -> f64 {
    percent_of(numerator, denominator).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_ratio_zero_denominator() {
        assert_eq!(safe_ratio(10.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
        assert_eq!(safe_ratio(10.0, 4.0), 2.5);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(50.0, 200.0), 25.0);
        assert_eq!(percent_of(300.0, 200.0), 150.0);
        assert_eq!(percent_of(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_clamped_percent_bounds() {
        assert_eq!(clamped_percent(700.0, 600.0), 100.0);
        assert_eq!(clamped_percent(-10.0, 100.0), 0.0);
        assert_eq!(clamped_percent(400.0, 1000.0), 40.0);
        assert_eq!(clamped_percent(1.0, 0.0), 0.0);
    }
}
