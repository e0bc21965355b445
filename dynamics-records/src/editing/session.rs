//! Edit sessions
//!
//! A session is opened when a record enters the edit or create form and is
//! dropped on save, cancel or abort. Dropping it tears down every lookup
//! timer it owns.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::changeset::{compute_create_payload, compute_update_payload};
use super::validation::{self, ValidationError};
use super::value::is_blank;
use crate::error::BrowserError;
use crate::metadata::{FieldDescriptor, FieldSchema, SelectOption};
use crate::search::{LookupFieldState, RequestToken};

/// Whether the session edits an existing record or creates a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Edit,
}

/// Record values captured when the session opened
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSnapshot {
    values: Map<String, Value>,
}

impl RecordSnapshot {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, field_name: &str) -> Option<&Value> {
        self.values.get(field_name)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A descriptor paired with its current working value, for rendering
#[derive(Debug, Clone)]
pub struct FieldWithValue<'a> {
    pub descriptor: &'a FieldDescriptor,
    pub value: &'a Value,
    /// Selected lookup label, or the picklist label of the value
    pub display_label: Option<&'a str>,
    pub lookup: Option<&'a LookupFieldState>,
}

/// An open edit or create form
#[derive(Debug)]
pub struct EditSession {
    object_type: String,
    record_id: Option<String>,
    id_field: String,
    schema: Arc<FieldSchema>,
    original: RecordSnapshot,
    working: Map<String, Value>,
    mode: EditMode,
    lookups: HashMap<String, LookupFieldState>,
}

impl EditSession {
    /// Open an edit session seeded with `record`.
    ///
    /// The record must carry a non-blank identity value in `id_field`.
    pub fn edit(
        schema: Arc<FieldSchema>,
        record: Map<String, Value>,
        id_field: &str,
        lookup_labels: &HashMap<String, String>,
    ) -> Result<Self, BrowserError> {
        let record_id = match record.get(id_field) {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(BrowserError::MissingIdentity {
                    object_type: schema.object_type.clone(),
                    id_field: id_field.to_string(),
                });
            }
        };

        let working = schema
            .iter()
            .map(|d| {
                let value = record.get(&d.field_name).cloned().unwrap_or(Value::Null);
                (d.field_name.clone(), value)
            })
            .collect();

        let lookups = schema
            .iter()
            .filter(|d| d.is_external_lookup)
            .filter_map(|d| {
                let label = lookup_labels.get(&d.field_name)?;
                Some((d.field_name.clone(), LookupFieldState::with_label(label.clone())))
            })
            .collect();

        Ok(Self {
            object_type: schema.object_type.clone(),
            record_id: Some(record_id),
            id_field: id_field.to_string(),
            original: RecordSnapshot::new(record),
            working,
            mode: EditMode::Edit,
            lookups,
            schema,
        })
    }

    /// Open a create session with every field empty
    pub fn create(schema: Arc<FieldSchema>, id_field: &str) -> Self {
        let working = schema
            .iter()
            .map(|d| (d.field_name.clone(), Value::Null))
            .collect();

        Self {
            object_type: schema.object_type.clone(),
            record_id: None,
            id_field: id_field.to_string(),
            original: RecordSnapshot::default(),
            working,
            mode: EditMode::Create,
            lookups: HashMap::new(),
            schema,
        }
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.schema.descriptors
    }

    pub fn descriptor(&self, field_name: &str) -> Option<&FieldDescriptor> {
        self.schema.get(field_name)
    }

    pub fn original(&self) -> &RecordSnapshot {
        &self.original
    }

    pub fn working(&self) -> &Map<String, Value> {
        &self.working
    }

    pub fn value(&self, field_name: &str) -> Option<&Value> {
        self.working.get(field_name)
    }

    /// Write a user-entered value into the working copy.
    ///
    /// Lookup fields are rejected: their value only changes through
    /// [`Self::select_lookup_option`] or [`Self::clear_lookup`].
    pub fn set_value(&mut self, field_name: &str, value: Value) -> Result<(), BrowserError> {
        match self.schema.get(field_name) {
            None => {
                return Err(BrowserError::UnknownField {
                    field_name: field_name.to_string(),
                });
            }
            Some(descriptor) if descriptor.is_external_lookup => {
                return Err(BrowserError::LookupRequiresSelection {
                    field_name: field_name.to_string(),
                });
            }
            Some(_) => {}
        }
        self.working.insert(field_name.to_string(), value);
        Ok(())
    }

    pub fn lookup_state(&self, field_name: &str) -> Option<&LookupFieldState> {
        self.lookups.get(field_name)
    }

    /// Descriptor and (lazily created) lookup state of a lookup field
    pub fn lookup_parts_mut(
        &mut self,
        field_name: &str,
    ) -> Option<(&FieldDescriptor, &mut LookupFieldState)> {
        let descriptor = self.schema.get(field_name).filter(|d| d.is_external_lookup)?;
        let state = self.lookups.entry(field_name.to_string()).or_default();
        Some((descriptor, state))
    }

    /// Keystroke in a lookup field: the previous selection no longer holds
    pub(crate) fn clear_lookup_value(&mut self, field_name: &str) {
        self.working.insert(field_name.to_string(), Value::Null);
    }

    /// Store a chosen lookup option
    pub fn select_lookup_option(
        &mut self,
        field_name: &str,
        option: &SelectOption,
        token: RequestToken,
    ) -> Result<(), BrowserError> {
        let (_, state) = self.lookup_parts_mut(field_name).ok_or_else(|| BrowserError::UnknownField {
            field_name: field_name.to_string(),
        })?;
        state.apply_selection(option, token);
        self.working
            .insert(field_name.to_string(), Value::String(option.value.clone()));
        Ok(())
    }

    /// Explicit clear of a lookup field
    pub fn clear_lookup(&mut self, field_name: &str, token: RequestToken) -> Result<(), BrowserError> {
        let (_, state) = self.lookup_parts_mut(field_name).ok_or_else(|| BrowserError::UnknownField {
            field_name: field_name.to_string(),
        })?;
        state.reset(token);
        self.working.insert(field_name.to_string(), Value::Null);
        Ok(())
    }

    /// Descriptors paired with their working values, in form order
    pub fn fields_with_values(&self) -> Vec<FieldWithValue<'_>> {
        self.schema
            .iter()
            .map(|descriptor| {
                let value = self.working.get(&descriptor.field_name).unwrap_or(&Value::Null);
                let lookup = self.lookups.get(&descriptor.field_name);
                let display_label = if descriptor.is_external_lookup {
                    lookup.and_then(|state| state.selected_label.as_deref())
                } else {
                    value.as_str().and_then(|v| descriptor.picklist_label(v))
                };
                FieldWithValue {
                    descriptor,
                    value,
                    display_label,
                    lookup,
                }
            })
            .collect()
    }

    /// Inline validation message of one field
    pub fn field_error(&self, field_name: &str) -> Option<ValidationError> {
        let descriptor = self.schema.get(field_name)?;
        validation::validate_field(descriptor, self.working.get(field_name)).err()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(&self.schema.descriptors, &self.working)
    }

    /// Payload to submit.
    ///
    /// An edit with no meaningful change is rejected with `NoChanges`.
    pub fn changeset(&self) -> Result<Map<String, Value>, BrowserError> {
        match self.mode {
            EditMode::Create => Ok(compute_create_payload(&self.schema.descriptors, &self.working)),
            EditMode::Edit => {
                let payload = compute_update_payload(
                    &self.schema.descriptors,
                    self.original.values(),
                    &self.working,
                    &self.id_field,
                );
                if payload.is_empty() {
                    Err(BrowserError::NoChanges)
                } else {
                    Ok(payload)
                }
            }
        }
    }

    /// Whether any field differs from its starting value
    pub fn is_dirty(&self) -> bool {
        match self.mode {
            EditMode::Create => self.working.values().any(|value| !is_blank(value)),
            EditMode::Edit => self.changeset().is_ok(),
        }
    }
}
