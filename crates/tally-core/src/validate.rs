//! Input sanitizing and field validation
//!
//! Text arriving from clients is sanitized first (trimmed, stripped of
//! control characters and angle brackets, capped in length) and then
//! validated. Validation failures name the offending field.

use crate::error::{Error, Result};

/// Smallest accepted monetary amount for entries, budgets and targets
pub const MIN_AMOUNT: f64 = 0.01;

/// Clean free text from a request body
pub fn sanitize_text(input: &str, max_chars: usize) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .collect();
    let capped: String = cleaned.trim().chars().take(max_chars).collect();
    capped.trim_end().to_string()
}

/// Sanitize an optional text field, mapping empty results to `None`
pub fn sanitize_optional(input: Option<&str>, max_chars: usize) -> Option<String> {
    input
        .map(|s| sanitize_text(s, max_chars))
        .filter(|s| !s.is_empty())
}

/// Require `value` to be between `min` and `max` characters
pub fn text_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(Error::validation(
            field,
            format!("must be between {} and {} characters", min, max),
        ));
    }
    Ok(())
}

/// Require a finite amount of at least `min`
pub fn min_amount(field: &str, value: f64, min: f64) -> Result<()> {
    if !value.is_finite() || value < min {
        return Err(Error::validation(
            field,
            format!("must be at least {}", min),
        ));
    }
    Ok(())
}

/// Require a syntactically plausible email address
pub fn email(value: &str) -> Result<()> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::validation("email", "is not a valid email address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text_strips_markup_and_controls() {
        assert_eq!(sanitize_text("  <b>Rent</b>\n ", 200), "bRent/b");
        assert_eq!(sanitize_text("Coffee\u{0007}", 200), "Coffee");
        assert_eq!(sanitize_text("abcdef", 3), "abc");
    }

    #[test]
    fn test_sanitize_optional_empty_is_none() {
        assert_eq!(sanitize_optional(Some("   "), 50), None);
        assert_eq!(sanitize_optional(None, 50), None);
        assert_eq!(sanitize_optional(Some(" x "), 50), Some("x".to_string()));
    }

    #[test]
    fn test_text_length_names_field() {
        assert!(text_length("name", "abc", 3, 100).is_ok());
        match text_length("name", "ab", 3, 100) {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "name"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_min_amount() {
        assert!(min_amount("amount", 0.01, MIN_AMOUNT).is_ok());
        assert!(min_amount("amount", 0.0, MIN_AMOUNT).is_err());
        assert!(min_amount("amount", f64::NAN, MIN_AMOUNT).is_err());
        assert!(min_amount("current_amount", 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_email() {
        assert!(email("ana@example.com").is_ok());
        assert!(email("ana@localhost").is_err());
        assert!(email("no-at-sign").is_err());
        assert!(email("a b@example.com").is_err());
    }
}
