//! Error taxonomy for the browsing/editing engine
//!
//! Nothing here is fatal: every variant maps to a state transition plus a
//! user-visible message.

use crate::editing::ValidationError;

/// Errors surfaced by [`crate::RecordBrowser`] intents
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserError {
    /// The object type has no configured fields; the table/form degrades to empty
    Configuration { object_type: String },
    /// A field failed validation; the submission was not sent
    Validation(ValidationError),
    /// An edit was submitted without any meaningful change
    NoChanges,
    /// The data access collaborator failed or reported `success: false`
    Transport {
        operation: &'static str,
        message: String,
    },
    /// An edit session was opened on a record without its identity key
    MissingIdentity {
        object_type: String,
        id_field: String,
    },
    /// The intent is not allowed in the current phase
    InvalidState {
        action: &'static str,
        phase: String,
    },
    /// The field is not part of the active form
    UnknownField { field_name: String },
    /// Lookup values are set by selecting a search result, never by typing
    LookupRequiresSelection { field_name: String },
    /// Page sizes must be positive
    InvalidPageSize(usize),
}

impl BrowserError {
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            message
        };
        BrowserError::Transport { operation, message }
    }

    /// Whether the error was raised before any collaborator call was made
    pub fn is_local(&self) -> bool {
        !matches!(self, BrowserError::Transport { .. })
    }
}

impl std::fmt::Display for BrowserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowserError::Configuration { object_type } => {
                write!(f, "No fields are configured for '{}'", object_type)
            }
            BrowserError::Validation(error) => write!(f, "{}", error),
            BrowserError::NoChanges => write!(f, "No changes to save"),
            BrowserError::Transport { operation, message } => {
                write!(f, "Failed to {}: {}", operation, message)
            }
            BrowserError::MissingIdentity {
                object_type,
                id_field,
            } => write!(
                f,
                "Record of type '{}' has no '{}' value and cannot be edited",
                object_type, id_field
            ),
            BrowserError::InvalidState { action, phase } => {
                write!(f, "Cannot {} while {}", action, phase)
            }
            BrowserError::UnknownField { field_name } => {
                write!(f, "Field '{}' is not part of this form", field_name)
            }
            BrowserError::LookupRequiresSelection { field_name } => write!(
                f,
                "Field '{}' is a lookup; select one of its search results instead",
                field_name
            ),
            BrowserError::InvalidPageSize(size) => {
                write!(f, "Page size must be greater than zero (got {})", size)
            }
        }
    }
}

impl std::error::Error for BrowserError {}

impl From<ValidationError> for BrowserError {
    fn from(error: ValidationError) -> Self {
        BrowserError::Validation(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::ValidationRule;

    #[test]
    fn test_transport_message_fallback() {
        let error = BrowserError::transport("update record", "  ");
        assert_eq!(error.to_string(), "Failed to update record: Unknown error");
        assert!(!error.is_local());
    }

    #[test]
    fn test_validation_error_is_local() {
        let error: BrowserError = ValidationError {
            field_name: "Email".into(),
            label: "Email Address".into(),
            rule: ValidationRule::Email,
        }
        .into();
        assert!(error.is_local());
        assert!(error.to_string().contains("Email Address"));
        assert!(BrowserError::NoChanges.is_local());
    }
}
