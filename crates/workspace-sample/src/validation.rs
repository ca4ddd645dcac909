//! Rate input validation.

use crate::localize::currency_decimals;
use record_store::{Draft, FieldErrors};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, PoisonError};

pub const RATE_INPUT: &str = "rate";
pub const INVALID_RATE_ERROR: &str = "workspace.reimburse.invalidRateError";
pub const LOW_RATE_ERROR: &str = "workspace.reimburse.lowRateError";

/// Compiled rate patterns by (allowed decimals, decimal separator).
static RATE_PATTERNS: LazyLock<Mutex<HashMap<(u32, char), Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn rate_pattern(decimals: u32, decimal_separator: char) -> Result<Regex, regex::Error> {
    let mut patterns = RATE_PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(matcher) = patterns.get(&(decimals, decimal_separator)) {
        return Ok(matcher.clone());
    }
    let separators = if decimal_separator == '.' {
        ".".to_string()
    } else {
        format!("{}.", decimal_separator)
    };
    let matcher = Regex::new(&format!(
        r"^-?\d{{0,8}}([{}]\d{{1,{}}})?$",
        regex::escape(&separators),
        decimals
    ))?;
    patterns.insert((decimals, decimal_separator), matcher.clone());
    Ok(matcher)
}

/// Parses a rate typed in the user's locale.
///
/// Up to eight integer digits and one more decimal than the currency has; the error is
/// a translation key.
pub fn validate_rate_value(
    input: &str,
    currency: &str,
    decimal_separator: char,
) -> Result<f64, &'static str> {
    let input = input.trim();
    if input.is_empty() {
        return Err(INVALID_RATE_ERROR);
    }
    let matcher = rate_pattern(currency_decimals(currency) + 1, decimal_separator)
        .map_err(|_| INVALID_RATE_ERROR)?;
    if !matcher.is_match(input) {
        return Err(INVALID_RATE_ERROR);
    }
    let value: f64 = input
        .replace(decimal_separator, ".")
        .parse()
        .map_err(|_| INVALID_RATE_ERROR)?;
    if value <= 0.0 {
        return Err(LOW_RATE_ERROR);
    }
    Ok(value)
}

/// Form validator for the `rate` input.
pub fn rate_errors(values: &Draft, currency: &str, decimal_separator: char) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if let Err(key) = validate_rate_value(values.text(RATE_INPUT), currency, decimal_separator) {
        errors.insert(RATE_INPUT.to_string(), key.to_string());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_one_extra_decimal() {
        assert_eq!(validate_rate_value("0.655", "USD", '.'), Ok(0.655));
        assert_eq!(validate_rate_value("0.6555", "USD", '.'), Err(INVALID_RATE_ERROR));
        assert_eq!(validate_rate_value("12.5", "JPY", '.'), Ok(12.5));
        assert_eq!(validate_rate_value("12.55", "JPY", '.'), Err(INVALID_RATE_ERROR));
    }

    #[test]
    fn test_rejects_empty_garbage_and_too_many_digits() {
        assert_eq!(validate_rate_value("", "USD", '.'), Err(INVALID_RATE_ERROR));
        assert_eq!(validate_rate_value("abc", "USD", '.'), Err(INVALID_RATE_ERROR));
        assert_eq!(validate_rate_value("-", "USD", '.'), Err(INVALID_RATE_ERROR));
        assert_eq!(validate_rate_value("123456789", "USD", '.'), Err(INVALID_RATE_ERROR));
    }

    #[test]
    fn test_zero_and_negative_are_low() {
        assert_eq!(validate_rate_value("0", "USD", '.'), Err(LOW_RATE_ERROR));
        assert_eq!(validate_rate_value("-1.5", "USD", '.'), Err(LOW_RATE_ERROR));
    }

    #[test]
    fn test_cached_patterns_stay_per_currency_and_separator() {
        for _ in 0..3 {
            assert_eq!(validate_rate_value("1,25", "EUR", ','), Ok(1.25));
            assert_eq!(validate_rate_value("1,25", "USD", '.'), Err(INVALID_RATE_ERROR));
            assert_eq!(validate_rate_value("1.5", "JPY", '.'), Ok(1.5));
            assert_eq!(validate_rate_value("1.55", "JPY", '.'), Err(INVALID_RATE_ERROR));
        }
        let patterns = RATE_PATTERNS.lock().unwrap();
        assert!(patterns.contains_key(&(3, ',')));
        assert!(patterns.contains_key(&(1, '.')));
    }

    #[test]
    fn test_comma_locale() {
        assert_eq!(validate_rate_value("0,5", "EUR", ','), Ok(0.5));
        assert_eq!(validate_rate_value("0.5", "EUR", ','), Ok(0.5));
    }
}
