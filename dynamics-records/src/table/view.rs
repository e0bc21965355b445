//! Sort and page projection over loaded rows
//!
//! [`TableViewState`] only holds sort and paging parameters. The visible
//! window is recomputed from the rows on every read and never stored.

use std::cmp::Ordering;

use serde_json::Value;

use crate::api::Row;
use crate::editing::value::{is_blank, unwrap_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// A row in the visible window with its 1-based overall number
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedRow<'a> {
    pub number: usize,
    pub row: &'a Row,
}

/// The visible window of a table
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage<'a> {
    pub rows: Vec<NumberedRow<'a>>,
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_rows: usize,
}

impl TablePage<'_> {
    pub fn has_previous(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.total_pages
    }
}

/// Sort and paging parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableViewState {
    sort_field: Option<String>,
    sort_direction: SortDirection,
    page_index: usize,
    page_size: usize,
}

impl TableViewState {
    /// Unsorted, first page. A zero page size is raised to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            sort_field: None,
            sort_direction: SortDirection::Asc,
            page_index: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn sort_field(&self) -> Option<&str> {
        self.sort_field.as_deref()
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, row_count: usize) -> usize {
        row_count.div_ceil(self.page_size).max(1)
    }

    /// Sort by `field`; sorting by the current field flips the direction
    pub fn sort_by(&mut self, field: &str) {
        if self.sort_field.as_deref() == Some(field) {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_field = Some(field.to_string());
            self.sort_direction = SortDirection::Asc;
        }
    }

    pub fn set_page(&mut self, page_index: usize, row_count: usize) {
        self.page_index = page_index;
        self.clamp(row_count);
    }

    /// Change the page size. Zero is ignored and reported as `false`.
    pub fn set_page_size(&mut self, page_size: usize, row_count: usize) -> bool {
        if page_size == 0 {
            return false;
        }
        self.page_size = page_size;
        self.clamp(row_count);
        true
    }

    /// Keep the page index within `[1, total_pages]`
    pub fn clamp(&mut self, row_count: usize) {
        self.page_index = self.page_index.clamp(1, self.total_pages(row_count));
    }

    /// Sorted, windowed view of `rows`
    pub fn project<'a>(&self, rows: &'a [Row]) -> TablePage<'a> {
        let mut ordered: Vec<&Row> = rows.iter().collect();
        if let Some(field) = self.sort_field.as_deref() {
            let direction = self.sort_direction;
            // sort_by is stable, so ties keep their prior relative order
            ordered.sort_by(|a, b| compare_cells(a.get(field), b.get(field), direction));
        }

        let total_rows = rows.len();
        let total_pages = self.total_pages(total_rows);
        let page_index = self.page_index.clamp(1, total_pages);
        let offset = (page_index - 1) * self.page_size;

        let rows = ordered
            .into_iter()
            .enumerate()
            .skip(offset)
            .take(self.page_size)
            .map(|(position, row)| NumberedRow {
                number: position + 1,
                row,
            })
            .collect();

        TablePage {
            rows,
            page_index,
            page_size: self.page_size,
            total_pages,
            total_rows,
        }
    }
}

/// Compare two cells. Blank cells sort last in either direction; strings
/// compare case-insensitively, numbers numerically.
pub fn compare_cells(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    match (is_blank(a), is_blank(b)) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = compare_values(unwrap_value(a), unwrap_value(b));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => sort_key(a).cmp(&sort_key(b)),
    }
}

fn sort_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: &[Value]) -> Vec<Row> {
        values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                json!({"Id": i, "Name": value}).as_object().cloned().unwrap()
            })
            .collect()
    }

    fn names(page: &TablePage<'_>) -> Vec<Value> {
        page.rows.iter().map(|r| r.row["Name"].clone()).collect()
    }

    fn ids(page: &TablePage<'_>) -> Vec<i64> {
        page.rows.iter().map(|r| r.row["Id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn test_total_pages_and_clamp_on_page_size_change() {
        let data = rows(&vec![json!("x"); 205]);
        let mut view = TableViewState::new(50);
        assert_eq!(view.total_pages(data.len()), 5);

        view.set_page(5, data.len());
        assert_eq!(view.page_index(), 5);
        assert!(view.set_page_size(100, data.len()));
        assert_eq!(view.page_index(), 3);
        assert_eq!(view.project(&data).rows.len(), 5);
    }

    #[test]
    fn test_page_index_clamped_to_bounds() {
        let data = rows(&vec![json!("x"); 12]);
        let mut view = TableViewState::new(10);
        view.set_page(0, data.len());
        assert_eq!(view.page_index(), 1);
        view.set_page(9, data.len());
        assert_eq!(view.page_index(), 2);

        // Fewer rows after a reload
        view.clamp(3);
        assert_eq!(view.page_index(), 1);
        view.clamp(0);
        assert_eq!(view.page_index(), 1);
        assert!(!view.set_page_size(0, 3));
    }

    #[test]
    fn test_row_numbers_follow_page() {
        let data = rows(&vec![json!("x"); 25]);
        let mut view = TableViewState::new(10);
        view.set_page(3, data.len());
        let page = view.project(&data);
        let numbers: Vec<usize> = page.rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![21, 22, 23, 24, 25]);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn test_sort_case_insensitive_with_blanks_last() {
        let data = rows(&[json!("beta"), Value::Null, json!("Alpha"), json!(""), json!("gamma")]);
        let mut view = TableViewState::new(10);

        view.sort_by("Name");
        let page = view.project(&data);
        assert_eq!(
            names(&page),
            vec![json!("Alpha"), json!("beta"), json!("gamma"), Value::Null, json!("")]
        );

        view.sort_by("Name");
        assert_eq!(view.sort_direction(), SortDirection::Desc);
        let page = view.project(&data);
        assert_eq!(
            names(&page),
            vec![json!("gamma"), json!("beta"), json!("Alpha"), Value::Null, json!("")]
        );
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let data = rows(&[json!("b"), json!("A"), json!("a"), json!("B")]);
        let mut view = TableViewState::new(10);
        view.sort_by("Name");
        assert_eq!(ids(&view.project(&data)), vec![1, 2, 0, 3]);

        view.sort_by("Name");
        assert_eq!(ids(&view.project(&data)), vec![0, 3, 1, 2]);
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let data = rows(&[json!(10), json!(9), json!(100)]);
        let mut view = TableViewState::new(10);
        view.sort_by("Name");
        assert_eq!(names(&view.project(&data)), vec![json!(9), json!(10), json!(100)]);
    }

    #[test]
    fn test_unsorted_projection_keeps_load_order() {
        let data = rows(&[json!("c"), json!("a"), json!("b")]);
        let view = TableViewState::new(2);
        let page = view.project(&data);
        assert_eq!(ids(&page), vec![0, 1]);
        assert_eq!(page.total_pages, 2);
    }
}
