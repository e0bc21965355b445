//! Lookup target inference
//!
//! Determines which entity type a lookup search should query. An explicit
//! configured target always wins; otherwise the target is guessed from the
//! field name (`AccountId` -> `Account`, `OwnerId` -> `User`). The guess is a
//! naming convention, not a verified relationship, so callers should treat
//! it as a hint.

use super::models::FieldDescriptor;

/// Entity type that owner fields point at
pub const OWNER_TARGET_TYPE: &str = "User";

/// Resolve the lookup target for a descriptor, or `None` if nothing resolves
pub fn resolve_lookup_target(descriptor: &FieldDescriptor) -> Option<String> {
    let explicit = descriptor
        .lookup_target_type
        .as_deref()
        .map(str::trim)
        .filter(|target| !target.is_empty());

    match explicit {
        Some(target) => Some(target.to_string()),
        None => derive_lookup_target(&descriptor.field_name),
    }
}

/// Derive a target entity type from a (possibly qualified) field name
pub fn derive_lookup_target(field_name: &str) -> Option<String> {
    let trimmed = field_name.trim();
    let name = trimmed.rsplit('.').next().unwrap_or(trimmed);

    if name.len() <= 2 || !name.to_ascii_lowercase().ends_with("id") {
        return None;
    }

    // The suffix is two ASCII bytes, so this stays on a char boundary
    let base = &name[..name.len() - 2];

    if base.eq_ignore_ascii_case("owner") {
        Some(OWNER_TARGET_TYPE.to_string())
    } else {
        Some(base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FormPurpose, RawFieldConfig, resolve_descriptors};

    fn descriptor(entry: RawFieldConfig) -> FieldDescriptor {
        resolve_descriptors(&[entry], FormPurpose::Edit).remove(0)
    }

    #[test]
    fn test_owner_resolves_to_user() {
        assert_eq!(derive_lookup_target("OwnerId").as_deref(), Some("User"));
        assert_eq!(derive_lookup_target("ownerid").as_deref(), Some("User"));
    }

    #[test]
    fn test_qualified_name_uses_last_segment() {
        assert_eq!(derive_lookup_target("Account.ParentId").as_deref(), Some("Parent"));
        assert_eq!(derive_lookup_target("AccountId").as_deref(), Some("Account"));
    }

    #[test]
    fn test_non_lookup_names() {
        assert_eq!(derive_lookup_target("Name"), None);
        assert_eq!(derive_lookup_target("Id"), None);
        assert_eq!(derive_lookup_target("id"), None);
        assert_eq!(derive_lookup_target(""), None);
        assert_eq!(derive_lookup_target("Account."), None);
    }

    #[test]
    fn test_explicit_target_wins_and_is_trimmed() {
        let owner = descriptor(RawFieldConfig::new("OwnerId", "lookup").with_lookup_target(" Queue "));
        assert_eq!(resolve_lookup_target(&owner).as_deref(), Some("Queue"));
    }

    #[test]
    fn test_falls_back_to_field_name() {
        let contact = descriptor(RawFieldConfig::new("ReportsToId", "lookup"));
        assert_eq!(resolve_lookup_target(&contact).as_deref(), Some("ReportsTo"));

        let name = descriptor(RawFieldConfig::new("Name", "text"));
        assert_eq!(resolve_lookup_target(&name), None);
    }
}
