// --- File: crates/sheetbook_sheets/src/store.rs ---
use sheetbook_common::BoxFuture;

use crate::error::SheetError;

/// Rows of cell strings as returned by a read. Row 0 is the header row.
///
/// Rows may be shorter than the header when trailing cells are empty.
pub type Grid = Vec<Vec<String>>;

/// A data row located by a scan, with its 1-based sheet row number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundRow {
    pub row_number: usize,
    pub values: Vec<String>,
}

impl FoundRow {
    /// Cell at a 0-based column index; `None` when the row is shorter.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}

/// Storage seam for spreadsheet tabs.
///
/// Every method addresses a whole tab by its sheet name; implementations
/// decide how that maps onto their backend.
pub trait RowStore: Send + Sync {
    /// Reads the used range of a tab, header row included.
    fn read_range<'a>(&'a self, sheet: &'a str) -> BoxFuture<'a, Grid, SheetError>;

    /// Overwrites one cell. `row` is 1-based, `column` is in letter form.
    fn update_cell<'a>(
        &'a self,
        sheet: &'a str,
        row: usize,
        column: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, (), SheetError>;

    /// Appends a row after the last non-empty row of the tab.
    fn append_row<'a>(&'a self, sheet: &'a str, values: Vec<String>)
        -> BoxFuture<'a, (), SheetError>;

    /// Writes `new` only if the cell still holds `expected`.
    ///
    /// Returns `false` without writing when the cell has changed.
    fn compare_and_set_cell<'a>(
        &'a self,
        sheet: &'a str,
        row: usize,
        column: &'a str,
        expected: &'a str,
        new: &'a str,
    ) -> BoxFuture<'a, bool, SheetError>;
}

/// Position of `column` in the header row, matched exactly.
pub fn header_index(grid: &Grid, sheet: &str, column: &str) -> Result<usize, SheetError> {
    grid.first()
        .and_then(|header| header.iter().position(|name| name == column))
        .ok_or_else(|| SheetError::ColumnNotFound {
            sheet: sheet.to_string(),
            column: column.to_string(),
        })
}

/// First data row whose cell at `column` equals any of `targets`.
pub fn find_first<S: AsRef<str>>(grid: &Grid, column: usize, targets: &[S]) -> Option<FoundRow> {
    grid.iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| {
            row.get(column)
                .is_some_and(|cell| targets.iter().any(|t| t.as_ref() == cell))
        })
        .map(|(i, row)| FoundRow {
            row_number: i + 1,
            values: row.clone(),
        })
}

/// Parses a counter cell. Blank, missing or non-numeric values count as 0.
pub fn parse_count(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        vec![
            vec!["Booking ID".into(), "Payment Reference".into(), "Status".into()],
            vec!["BK-1".into(), "pi_1".into()],
            vec!["BK-2".into(), "pi_2".into(), "Confirmed".into()],
            vec!["BK-3".into(), "pi_2".into(), "".into()],
        ]
    }

    #[test]
    fn test_first_match_wins_and_row_numbers_are_one_based() {
        let found = find_first(&grid(), 1, &["pi_2"]).unwrap();
        assert_eq!(found.row_number, 3);
        assert_eq!(found.get(0), Some("BK-2"));
    }

    #[test]
    fn test_header_is_never_matched() {
        assert!(find_first(&grid(), 1, &["Payment Reference"]).is_none());
    }

    #[test]
    fn test_short_rows_do_not_match_missing_cells() {
        assert!(find_first(&grid(), 2, &[""]).map(|r| r.row_number) == Some(4));
    }

    #[test]
    fn test_header_index_is_exact() {
        assert_eq!(header_index(&grid(), "Bookings", "Status").unwrap(), 2);
        assert!(matches!(
            header_index(&grid(), "Bookings", "status"),
            Err(SheetError::ColumnNotFound { .. })
        ));
        assert!(header_index(&Vec::new(), "Bookings", "Status").is_err());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(Some(" 3 ")), 3);
        assert_eq!(parse_count(Some("abc")), 0);
        assert_eq!(parse_count(Some("")), 0);
        assert_eq!(parse_count(None), 0);
    }
}
