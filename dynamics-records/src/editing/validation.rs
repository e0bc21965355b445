//! Field validation
//!
//! Checks run over working values before any submission is attempted.
//! Format checks treat an empty value as valid; required-ness is checked
//! separately.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::value::{is_blank, unwrap_value};
use crate::metadata::{FieldDescriptor, FieldType};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[A-Za-z]{2,}$").expect("email pattern is valid")
});

/// Minimum digit count for a phone number
const MIN_PHONE_DIGITS: usize = 10;

/// Which rule a field violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    Required,
    /// A required lookup without an actual selection
    RequiredSelection,
    Email,
    Phone,
}

impl ValidationRule {
    pub fn describe(&self) -> &'static str {
        match self {
            ValidationRule::Required => "is required",
            ValidationRule::RequiredSelection => "requires a selected record",
            ValidationRule::Email => "must be a valid email address",
            ValidationRule::Phone => "must contain at least 10 digits",
        }
    }
}

/// First validation failure of a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field_name: String,
    pub label: String,
    pub rule: ValidationRule,
}

impl ValidationError {
    fn new(descriptor: &FieldDescriptor, rule: ValidationRule) -> Self {
        Self {
            field_name: descriptor.field_name.clone(),
            label: descriptor.label.clone(),
            rule,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.label, self.rule.describe())
    }
}

impl std::error::Error for ValidationError {}

/// Conventional `local@domain.tld` check; empty is valid
pub fn is_valid_email(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || EMAIL_PATTERN.is_match(trimmed)
}

/// At least 10 digits once non-digits are stripped; empty is valid
pub fn is_valid_phone(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS
}

/// Validate a single field against its working value
pub fn validate_field(descriptor: &FieldDescriptor, value: Option<&Value>) -> Result<(), ValidationError> {
    let value = value.unwrap_or(&Value::Null);

    if descriptor.required && is_blank(value) {
        let rule = if descriptor.is_external_lookup {
            ValidationRule::RequiredSelection
        } else {
            ValidationRule::Required
        };
        return Err(ValidationError::new(descriptor, rule));
    }

    let text = match unwrap_value(value) {
        Value::String(s) => s.as_str(),
        _ => return Ok(()),
    };

    match descriptor.field_type {
        FieldType::Email if !is_valid_email(text) => {
            Err(ValidationError::new(descriptor, ValidationRule::Email))
        }
        FieldType::Phone if !is_valid_phone(text) => {
            Err(ValidationError::new(descriptor, ValidationRule::Phone))
        }
        _ => Ok(()),
    }
}

/// Validate every descriptor in order, stopping at the first failure
pub fn validate(descriptors: &[FieldDescriptor], working: &Map<String, Value>) -> Result<(), ValidationError> {
    for descriptor in descriptors {
        validate_field(descriptor, working.get(&descriptor.field_name))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FormPurpose, RawFieldConfig, resolve_descriptors};
    use serde_json::json;

    fn descriptors() -> Vec<FieldDescriptor> {
        resolve_descriptors(
            &[
                RawFieldConfig::new("Name", "text").with_order(1).required(),
                RawFieldConfig::new("Email", "email").with_order(2).with_label("Email Address"),
                RawFieldConfig::new("Phone", "phone").with_order(3),
                RawFieldConfig::new("OwnerId", "lookup").with_order(4).with_label("Owner").required(),
            ],
            FormPurpose::Edit,
        )
    }

    fn working(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@example.co.uk"));
        assert!(is_valid_email(""));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@b.c"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("415-555-0100"));
        assert!(is_valid_phone("(415) 555 0100"));
        assert!(is_valid_phone(""));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("phone"));
    }

    #[test]
    fn test_valid_form() {
        let values = working(&[
            ("Name", json!("Acme")),
            ("Email", json!("")),
            ("Phone", Value::Null),
            ("OwnerId", json!("005000000000001")),
        ]);
        assert!(validate(&descriptors(), &values).is_ok());
    }

    #[test]
    fn test_required_field_missing() {
        let values = working(&[("Name", json!("  ")), ("OwnerId", json!("005"))]);
        let error = validate(&descriptors(), &values).unwrap_err();
        assert_eq!(error.field_name, "Name");
        assert_eq!(error.rule, ValidationRule::Required);
        assert_eq!(error.to_string(), "Name is required");
    }

    #[test]
    fn test_first_failure_wins() {
        let values = working(&[
            ("Name", json!("Acme")),
            ("Email", json!("bad")),
            ("Phone", json!("123")),
            ("OwnerId", json!("005")),
        ]);
        let error = validate(&descriptors(), &values).unwrap_err();
        assert_eq!(error.rule, ValidationRule::Email);
        assert_eq!(error.to_string(), "Email Address must be a valid email address");
    }

    #[test]
    fn test_required_lookup_needs_selection() {
        let values = working(&[("Name", json!("Acme")), ("OwnerId", Value::Null)]);
        let error = validate(&descriptors(), &values).unwrap_err();
        assert_eq!(error.field_name, "OwnerId");
        assert_eq!(error.rule, ValidationRule::RequiredSelection);
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let values = working(&[("Name", json!("Acme")), ("Phone", json!("12"))]);
        let before = values.clone();
        let _ = validate(&descriptors(), &values);
        assert_eq!(values, before);
    }
}
