//! Request/response models exchanged with the data access collaborator

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BrowserError;
use crate::metadata::RawFieldConfig;

/// One record as a field name -> raw value mapping
pub type Row = Map<String, Value>;

/// Field name -> value mapping sent on create/update
pub type Payload = Map<String, Value>;

/// Response of `list_records`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordList {
    pub success: bool,
    pub records: Vec<Row>,
    pub columns: Vec<RawFieldConfig>,
    pub error_message: Option<String>,
}

impl RecordList {
    pub fn ok(records: Vec<Row>, columns: Vec<RawFieldConfig>) -> Self {
        Self {
            success: true,
            records,
            columns,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Response of `get_record_for_edit`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditableRecord {
    pub record: Row,
    pub edit_fields: Vec<RawFieldConfig>,
    /// Display labels for lookup values, keyed by field name
    pub lookup_labels: HashMap<String, String>,
}

/// Response of create/update/delete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MutationResponse {
    pub success: bool,
    pub error_message: Option<String>,
}

impl MutationResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
        }
    }

    /// Fold a collaborator result into the engine's error taxonomy
    pub fn into_outcome(
        result: anyhow::Result<Self>,
        operation: &'static str,
    ) -> Result<(), BrowserError> {
        match result {
            Ok(response) if response.success => Ok(()),
            Ok(response) => Err(BrowserError::transport(
                operation,
                response.error_message.unwrap_or_default(),
            )),
            Err(error) => Err(BrowserError::transport(operation, format!("{:#}", error))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_folding() {
        assert!(MutationResponse::into_outcome(Ok(MutationResponse::ok()), "delete record").is_ok());

        let failed = MutationResponse::into_outcome(Ok(MutationResponse::failed("locked")), "delete record");
        assert_eq!(
            failed.unwrap_err().to_string(),
            "Failed to delete record: locked"
        );

        let missing = MutationResponse::into_outcome(Ok(MutationResponse::default()), "delete record");
        assert_eq!(
            missing.unwrap_err().to_string(),
            "Failed to delete record: Unknown error"
        );

        let errored = MutationResponse::into_outcome(Err(anyhow::anyhow!("timeout")), "create record");
        assert!(matches!(
            errored,
            Err(BrowserError::Transport { operation: "create record", .. })
        ));
    }

    #[test]
    fn test_record_list_deserializes_camel_case() {
        let list: RecordList = serde_json::from_str(
            r#"{"success": false, "errorMessage": "Insufficient access"}"#,
        )
        .unwrap();
        assert!(!list.success);
        assert_eq!(list.error_message.as_deref(), Some("Insufficient access"));
        assert!(list.records.is_empty());
    }
}
