//! Resolves raw configuration entries into ordered field descriptor sets

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::models::{FieldDescriptor, FieldType, FormPurpose, RawFieldConfig};

/// Ordered descriptor set for one (object type, purpose) pair
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub object_type: String,
    pub purpose: FormPurpose,
    pub descriptors: Vec<FieldDescriptor>,
}

impl FieldSchema {
    pub fn resolve(object_type: &str, purpose: FormPurpose, entries: &[RawFieldConfig]) -> Self {
        let applicable: Vec<RawFieldConfig> = entries
            .iter()
            .filter(|entry| match entry.object_type.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(owner) => owner.eq_ignore_ascii_case(object_type),
            })
            .cloned()
            .collect();

        Self {
            object_type: object_type.to_string(),
            purpose,
            descriptors: resolve_descriptors(&applicable, purpose),
        }
    }

    pub fn get(&self, field_name: &str) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| d.field_name == field_name)
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.descriptors.iter()
    }
}

/// Turn raw entries into descriptors sorted by `order`, then `field_name`.
///
/// Entries without a field name are skipped; duplicate field names keep the
/// entry that sorts first. An empty input yields an empty set.
pub fn resolve_descriptors(entries: &[RawFieldConfig], purpose: FormPurpose) -> Vec<FieldDescriptor> {
    let mut descriptors: Vec<FieldDescriptor> = entries
        .iter()
        .filter_map(|entry| {
            let descriptor = resolve_entry(entry, purpose);
            if descriptor.is_none() {
                log::warn!("Skipping {} field config without a field name", purpose);
            }
            descriptor
        })
        .collect();

    descriptors.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| a.field_name.cmp(&b.field_name))
    });

    let mut seen = HashSet::new();
    descriptors.retain(|d| {
        let first = seen.insert(d.field_name.clone());
        if !first {
            log::warn!("Duplicate {} field '{}' ignored", purpose, d.field_name);
        }
        first
    });

    descriptors
}

fn resolve_entry(entry: &RawFieldConfig, purpose: FormPurpose) -> Option<FieldDescriptor> {
    let field_name = entry.field_name.trim();
    if field_name.is_empty() {
        return None;
    }

    let mut field_type = entry
        .field_type
        .as_deref()
        .map(FieldType::parse)
        .unwrap_or_default();

    let is_external_lookup = entry.is_external_lookup || field_type == FieldType::LookupExternal;
    if is_external_lookup {
        field_type = FieldType::LookupExternal;
    }

    let lookup_target_type = if is_external_lookup {
        entry
            .lookup_target_type
            .as_deref()
            .map(str::trim)
            .filter(|target| !target.is_empty())
            .map(str::to_string)
    } else {
        None
    };

    let picklist_options = if field_type == FieldType::Picklist {
        if entry.picklist_options.is_empty() {
            log::debug!("Picklist field '{}' has no configured options", field_name);
        }
        entry.picklist_options.clone()
    } else {
        Vec::new()
    };

    let label = entry
        .label
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .unwrap_or(field_name)
        .to_string();

    Some(FieldDescriptor {
        field_name: field_name.to_string(),
        label,
        field_type,
        order: entry.order.unwrap_or(i64::MAX),
        required: entry.required,
        // Sorting only applies to table columns
        sortable: purpose == FormPurpose::Table && entry.sortable.unwrap_or(true),
        is_link: purpose == FormPurpose::Table && entry.is_link,
        is_external_lookup,
        lookup_target_type,
        picklist_options,
    })
}

/// Resolved schemas keyed by (object type, purpose).
///
/// A schema is resolved once and reused until the object type changes.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: HashMap<(String, FormPurpose), Arc<FieldSchema>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_resolve(
        &mut self,
        object_type: &str,
        purpose: FormPurpose,
        entries: &[RawFieldConfig],
    ) -> Arc<FieldSchema> {
        let key = (object_type.to_string(), purpose);
        if let Some(schema) = self.schemas.get(&key) {
            return Arc::clone(schema);
        }

        let schema = Arc::new(FieldSchema::resolve(object_type, purpose, entries));
        log::debug!(
            "Resolved {} {} fields for {}",
            schema.len(),
            purpose,
            object_type
        );
        self.schemas.insert(key, Arc::clone(&schema));
        schema
    }

    /// Drop every schema not belonging to `object_type`
    pub fn retain_object(&mut self, object_type: &str) {
        self.schemas.retain(|(object, _), _| object == object_type);
    }
}
