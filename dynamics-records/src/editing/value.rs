//! Value normalization for change detection and display

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Date-time layouts accepted besides RFC 3339
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z", // 2024-01-05T00:00:00.000+0000
    "%Y-%m-%dT%H:%M:%S%z",    // 2024-01-05T00:00:00+0000
];

/// Naive date-time layouts, interpreted as UTC
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f", // 2024-01-05T10:30:00.000
    "%Y-%m-%dT%H:%M:%S",    // 2024-01-05T10:30:00
    "%Y-%m-%d %H:%M:%S",    // 2024-01-05 10:30:00
    "%Y-%m-%dT%H:%M",       // 2024-01-05T10:30
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2024-01-05
    "%m/%d/%Y", // 01/05/2024
];

/// Unwrap a single-level `{"value": X}` wrapper
pub fn unwrap_value(value: &Value) -> &Value {
    match value {
        Value::Object(map) => map.get("value").unwrap_or(value),
        _ => value,
    }
}

/// Parse a string as a calendar date, returning the UTC date
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    None
}

/// Canonical comparison form of a value.
///
/// `null` and empty strings both normalize to `""`. Strings that parse as a
/// calendar date normalize to `YYYY-MM-DD`; other strings are trimmed.
pub fn normalize_value(value: &Value) -> String {
    match unwrap_value(value) {
        Value::Null => String::new(),
        Value::String(s) => {
            let trimmed = s.trim();
            match parse_calendar_date(trimmed) {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => trimmed.to_string(),
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Whether a value is null or an empty/whitespace string
pub fn is_blank(value: &Value) -> bool {
    match unwrap_value(value) {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Human-readable form of a cell or field value
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Object(map) => match (map.get("label"), map.get("value")) {
            (Some(Value::String(label)), _) => label.clone(),
            (_, Some(inner)) => display_value(inner),
            _ => value.to_string(),
        },
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_empty_string_are_equal() {
        assert_eq!(normalize_value(&Value::Null), normalize_value(&json!("")));
        assert_eq!(normalize_value(&json!("   ")), "");
    }

    #[test]
    fn test_value_wrapper_is_unwrapped_once() {
        assert_eq!(normalize_value(&json!({"value": "Acme"})), "Acme");
        assert_eq!(normalize_value(&json!({"value": {"value": "x"}})), r#"{"value":"x"}"#);
    }

    #[test]
    fn test_dates_compare_by_calendar_day() {
        let plain = normalize_value(&json!("2024-01-05"));
        assert_eq!(plain, "2024-01-05");
        assert_eq!(normalize_value(&json!("2024-01-05T00:00:00.000Z")), plain);
        assert_eq!(normalize_value(&json!("2024-01-05T00:00:00.000+0000")), plain);
        assert_eq!(normalize_value(&json!("2024-01-05T00:00:00")), plain);
        assert_eq!(normalize_value(&json!("01/05/2024")), plain);
    }

    #[test]
    fn test_offsets_convert_to_utc_day() {
        assert_eq!(normalize_value(&json!("2024-01-05T23:30:00-02:00")), "2024-01-06");
    }

    #[test]
    fn test_non_date_strings_are_trimmed() {
        assert_eq!(normalize_value(&json!("  Acme Corp ")), "Acme Corp");
        assert_eq!(normalize_value(&json!("2024-13-45")), "2024-13-45");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(normalize_value(&json!(42)), "42");
        assert_eq!(normalize_value(&json!(true)), "true");
        assert!(is_blank(&json!({"value": null})));
        assert!(!is_blank(&json!(false)));
        assert!(!is_blank(&json!(0)));
    }

    #[test]
    fn test_display_value_prefers_label() {
        assert_eq!(display_value(&json!({"value": "005", "label": "Ada"})), "Ada");
        assert_eq!(display_value(&json!({"value": 3})), "3");
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&json!(1.5)), "1.5");
    }
}
