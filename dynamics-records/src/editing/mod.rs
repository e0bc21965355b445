//! Edit sessions, change-set computation and field validation

pub mod changeset;
pub mod session;
pub mod validation;
pub mod value;

pub use changeset::{compute_create_payload, compute_update_payload};
pub use session::{EditMode, EditSession, FieldWithValue, RecordSnapshot};
pub use validation::{ValidationError, ValidationRule, is_valid_email, is_valid_phone, validate, validate_field};
pub use value::{display_value, is_blank, normalize_value, parse_calendar_date};
