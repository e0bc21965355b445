//! Metadata-driven record browsing and editing engine
//!
//! Turns configuration-supplied field descriptors into table and form models,
//! tracks edits against a snapshot to compute minimal change-sets, services
//! search-as-you-type lookups, and coordinates load/edit/submit/delete against
//! an external data store through the [`api::DataAccess`] collaborator.

pub mod api;
pub mod browser;
pub mod config;
pub mod editing;
pub mod error;
pub mod metadata;
pub mod search;
pub mod table;

pub use api::{DataAccess, EditableRecord, MemoryStore, MutationResponse, Payload, RecordList, Row};
pub use browser::{BrowserPhase, BrowserView, Intent, RecordBrowser};
pub use config::{BrowserConfig, SearchConfig};
pub use editing::{EditMode, EditSession, FieldWithValue, RecordSnapshot, ValidationError, ValidationRule};
pub use error::BrowserError;
pub use metadata::{FieldDescriptor, FieldType, FormPurpose, RawFieldConfig, SelectOption};
pub use search::{LookupFieldState, SearchController, SearchEvent, SearchPhase, SearchTransition};
pub use table::{ColumnKind, SortDirection, TableColumn, TablePage, TableViewState};
