//! Field descriptor models

use serde::{Deserialize, Serialize};

/// Normalized field type of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Phone,
    Date,
    Picklist,
    LookupExternal,
    Number,
    Boolean,
}

impl FieldType {
    /// Parse a configuration type string. Unknown or blank types become `Text`.
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "email" => FieldType::Email,
            "phone" | "tel" => FieldType::Phone,
            "date" | "datetime" => FieldType::Date,
            "picklist" | "optionset" => FieldType::Picklist,
            "lookupexternal" | "externallookup" | "lookup" => FieldType::LookupExternal,
            "number" | "integer" | "int" | "double" | "decimal" | "currency" | "percent" => {
                FieldType::Number
            }
            "boolean" | "bool" | "checkbox" => FieldType::Boolean,
            _ => FieldType::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Date => "date",
            FieldType::Picklist => "picklist",
            FieldType::LookupExternal => "lookup-external",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a descriptor set is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormPurpose {
    Table,
    Edit,
    Create,
}

impl std::fmt::Display for FormPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormPurpose::Table => write!(f, "table"),
            FormPurpose::Edit => write!(f, "edit"),
            FormPurpose::Create => write!(f, "create"),
        }
    }
}

/// A `{value, label}` pair, used for picklist entries and lookup candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// One configuration entry as stored in the configuration records.
///
/// Entries come from several sources with inconsistent key casing, so every
/// key accepts its camelCase, snake_case and PascalCase spelling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawFieldConfig {
    #[serde(alias = "object_type", alias = "ObjectType")]
    pub object_type: Option<String>,
    #[serde(alias = "field_name", alias = "FieldName")]
    pub field_name: String,
    #[serde(alias = "Label")]
    pub label: Option<String>,
    #[serde(rename = "type", alias = "fieldType", alias = "field_type", alias = "Type")]
    pub field_type: Option<String>,
    #[serde(alias = "Order")]
    pub order: Option<i64>,
    #[serde(alias = "Required")]
    pub required: bool,
    #[serde(alias = "Sortable")]
    pub sortable: Option<bool>,
    #[serde(alias = "is_link", alias = "IsLink")]
    pub is_link: bool,
    #[serde(alias = "is_external_lookup", alias = "IsExternalLookup")]
    pub is_external_lookup: bool,
    #[serde(alias = "lookup_target_type", alias = "LookupTargetType")]
    pub lookup_target_type: Option<String>,
    #[serde(alias = "picklist_options", alias = "PicklistOptions")]
    pub picklist_options: Vec<SelectOption>,
}

impl RawFieldConfig {
    pub fn new(field_name: impl Into<String>, field_type: &str) -> Self {
        Self {
            field_name: field_name.into(),
            field_type: Some(field_type.to_string()),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn link(mut self) -> Self {
        self.is_link = true;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = Some(sortable);
        self
    }

    pub fn with_lookup_target(mut self, target: impl Into<String>) -> Self {
        self.is_external_lookup = true;
        self.lookup_target_type = Some(target.into());
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.picklist_options = options;
        self
    }
}

/// Normalized, immutable description of one column or form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub field_name: String,
    pub label: String,
    pub field_type: FieldType,
    pub order: i64,
    pub required: bool,
    pub sortable: bool,
    /// Rendered as a row-action trigger in tables, never edited inline
    pub is_link: bool,
    pub is_external_lookup: bool,
    /// Only set when `is_external_lookup`
    pub lookup_target_type: Option<String>,
    /// Only non-empty when `field_type` is `Picklist`
    pub picklist_options: Vec<SelectOption>,
}

impl FieldDescriptor {
    pub fn is_inline_editable(&self) -> bool {
        !self.is_link
    }

    /// Label for a picklist value, if the value is one of the configured options
    pub fn picklist_label(&self, value: &str) -> Option<&str> {
        self.picklist_options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parse() {
        assert_eq!(FieldType::parse("email"), FieldType::Email);
        assert_eq!(FieldType::parse("EMAIL"), FieldType::Email);
        assert_eq!(FieldType::parse("lookup-external"), FieldType::LookupExternal);
        assert_eq!(FieldType::parse("Lookup_External"), FieldType::LookupExternal);
        assert_eq!(FieldType::parse("currency"), FieldType::Number);
        assert_eq!(FieldType::parse("checkbox"), FieldType::Boolean);
        assert_eq!(FieldType::parse("DateTime"), FieldType::Date);
    }

    #[test]
    fn test_unknown_and_blank_types_default_to_text() {
        assert_eq!(FieldType::parse(""), FieldType::Text);
        assert_eq!(FieldType::parse("   "), FieldType::Text);
        assert_eq!(FieldType::parse("geolocation"), FieldType::Text);
    }

    #[test]
    fn test_raw_config_accepts_mixed_casing() {
        let json = r#"[
            {"fieldName": "Email", "type": "email", "order": 2, "required": true},
            {"field_name": "Phone", "field_type": "phone", "is_link": true},
            {"FieldName": "OwnerId", "Type": "lookup", "IsExternalLookup": true, "LookupTargetType": " User "}
        ]"#;

        let entries: Vec<RawFieldConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].field_name, "Email");
        assert!(entries[0].required);
        assert_eq!(entries[0].order, Some(2));
        assert_eq!(entries[1].field_type.as_deref(), Some("phone"));
        assert!(entries[1].is_link);
        assert!(entries[2].is_external_lookup);
        assert_eq!(entries[2].lookup_target_type.as_deref(), Some(" User "));
    }
}
