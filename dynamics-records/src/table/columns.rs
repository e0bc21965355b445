//! Table column model

use crate::metadata::{FieldDescriptor, FieldType};

/// How a column renders its cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Inline value
    Value,
    /// Clickable trigger that opens the record; never edited inline
    RowAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub field_name: String,
    pub label: String,
    pub field_type: FieldType,
    pub sortable: bool,
    pub kind: ColumnKind,
}

impl TableColumn {
    pub fn is_row_action(&self) -> bool {
        self.kind == ColumnKind::RowAction
    }
}

impl From<&FieldDescriptor> for TableColumn {
    fn from(descriptor: &FieldDescriptor) -> Self {
        Self {
            field_name: descriptor.field_name.clone(),
            label: descriptor.label.clone(),
            field_type: descriptor.field_type,
            sortable: descriptor.sortable,
            kind: if descriptor.is_link {
                ColumnKind::RowAction
            } else {
                ColumnKind::Value
            },
        }
    }
}

pub fn build_columns(descriptors: &[FieldDescriptor]) -> Vec<TableColumn> {
    descriptors.iter().map(TableColumn::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FormPurpose, RawFieldConfig, resolve_descriptors};

    #[test]
    fn test_link_columns_become_row_actions() {
        let descriptors = resolve_descriptors(
            &[
                RawFieldConfig::new("Name", "text").with_order(1).link(),
                RawFieldConfig::new("Phone", "phone").with_order(2).with_sortable(false),
            ],
            FormPurpose::Table,
        );
        let columns = build_columns(&descriptors);
        assert!(columns[0].is_row_action());
        assert!(columns[0].sortable);
        assert_eq!(columns[1].kind, ColumnKind::Value);
        assert!(!columns[1].sortable);
    }
}
