//! Change-set computation
//!
//! Edit mode sends only fields whose normalized working value differs from
//! the snapshot. Create mode sends every non-empty working value.

use serde_json::{Map, Value};

use super::value::{is_blank, normalize_value};
use crate::metadata::FieldDescriptor;

/// Fields whose working value meaningfully differs from the original.
///
/// The raw working value is sent; a cleared field is sent as `""`.
pub fn compute_update_payload(
    descriptors: &[FieldDescriptor],
    original: &Map<String, Value>,
    working: &Map<String, Value>,
    id_field: &str,
) -> Map<String, Value> {
    let mut payload = Map::new();

    for descriptor in descriptors {
        let name = &descriptor.field_name;
        if name == id_field {
            continue;
        }

        let current = working.get(name).unwrap_or(&Value::Null);
        let before = original.get(name).unwrap_or(&Value::Null);

        if normalize_value(current) == normalize_value(before) {
            continue;
        }

        log::debug!(
            "Field '{}' changed: '{}' -> '{}'",
            name,
            normalize_value(before),
            normalize_value(current)
        );

        let sent = if current.is_null() {
            Value::String(String::new())
        } else {
            current.clone()
        };
        payload.insert(name.clone(), sent);
    }

    payload
}

/// Every field with a non-null, non-empty working value
pub fn compute_create_payload(
    descriptors: &[FieldDescriptor],
    working: &Map<String, Value>,
) -> Map<String, Value> {
    descriptors
        .iter()
        .filter_map(|descriptor| {
            let value = working.get(&descriptor.field_name)?;
            if is_blank(value) {
                None
            } else {
                Some((descriptor.field_name.clone(), value.clone()))
            }
        })
        .collect()
}
