use serde_json::Value;

use crate::editing::{EditMode, FieldWithValue};
use crate::error::BrowserError;
use crate::metadata::SelectOption;
use crate::table::{SortDirection, TableColumn, TablePage};

/// Where the browser is in its load/edit/submit/delete cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BrowserPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadError(String),
    Editing,
    Submitting,
    Deleting,
    DeleteError(String),
}

impl BrowserPhase {
    /// Whether the table is showing and accepts browse intents
    pub fn is_browsing(&self) -> bool {
        matches!(
            self,
            BrowserPhase::Loaded | BrowserPhase::LoadError(_) | BrowserPhase::DeleteError(_)
        )
    }

    /// A collaborator call is in flight
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            BrowserPhase::Loading | BrowserPhase::Submitting | BrowserPhase::Deleting
        )
    }
}

impl std::fmt::Display for BrowserPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowserPhase::Idle => write!(f, "idle"),
            BrowserPhase::Loading => write!(f, "loading"),
            BrowserPhase::Loaded => write!(f, "loaded"),
            BrowserPhase::LoadError(_) => write!(f, "load failed"),
            BrowserPhase::Editing => write!(f, "editing"),
            BrowserPhase::Submitting => write!(f, "submitting"),
            BrowserPhase::Deleting => write!(f, "deleting"),
            BrowserPhase::DeleteError(_) => write!(f, "delete failed"),
        }
    }
}

/// User intents accepted by [`crate::RecordBrowser::dispatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    // Table
    Search(String),
    Sort(String),
    ChangePage(usize),
    ChangePageSize(usize),

    // Form
    StartEdit(String),
    StartCreate,
    /// Non-lookup fields only; lookups go through `SelectLookupOption`
    ChangeField { field: String, value: Value },
    LookupInput { field: String, term: String },
    LookupBlur(String),
    SelectLookupOption { field: String, option: SelectOption },
    ClearLookup(String),
    Submit,
    Cancel,

    // Delete confirmation
    Delete(String),
    ConfirmDelete,
    CancelDelete,
}

/// Read-only snapshot handed to the rendering layer
#[derive(Debug)]
pub struct BrowserView<'a> {
    pub object_type: &'a str,
    pub phase: &'a BrowserPhase,
    pub is_loading: bool,
    pub columns: &'a [TableColumn],
    pub page: TablePage<'a>,
    pub sort_field: Option<&'a str>,
    pub sort_direction: SortDirection,
    pub page_size_options: &'a [usize],
    pub search_term: &'a str,
    pub error: Option<&'a BrowserError>,
    pub notice: Option<&'a str>,
    pub configuration_warning: Option<&'a BrowserError>,
    pub pending_delete: Option<&'a str>,
    pub edit_mode: Option<EditMode>,
    /// Fields of the open form, empty when no form is open
    pub fields: Vec<FieldWithValue<'a>>,
}

impl BrowserView<'_> {
    pub fn has_form(&self) -> bool {
        self.edit_mode.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_groups() {
        assert!(BrowserPhase::Loaded.is_browsing());
        assert!(BrowserPhase::DeleteError("x".into()).is_browsing());
        assert!(!BrowserPhase::Editing.is_browsing());
        assert!(BrowserPhase::Submitting.is_busy());
        assert!(!BrowserPhase::Idle.is_busy());
        assert_eq!(BrowserPhase::LoadError("x".into()).to_string(), "load failed");
    }
}
