//! Field metadata: raw configuration entries and the descriptors resolved from them

pub mod lookup;
pub mod models;
pub mod resolver;

pub use lookup::{OWNER_TARGET_TYPE, derive_lookup_target, resolve_lookup_target};
pub use models::{FieldDescriptor, FieldType, FormPurpose, RawFieldConfig, SelectOption};
pub use resolver::{FieldSchema, SchemaCache, resolve_descriptors};
