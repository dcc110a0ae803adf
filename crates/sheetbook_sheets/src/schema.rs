// --- File: crates/sheetbook_sheets/src/schema.rs ---
//! Declared table layouts, checked against the live header row at startup.

use std::collections::HashMap;

use crate::address::column_letter;
use crate::error::SheetError;
use crate::store::FoundRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub required: bool,
}

/// The columns a tab is expected to carry.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub sheet: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            columns: Vec::new(),
        }
    }

    pub fn required(mut self, name: &'static str) -> Self {
        self.columns.push(ColumnSpec { name, required: true });
        self
    }

    pub fn optional(mut self, name: &'static str) -> Self {
        self.columns.push(ColumnSpec {
            name,
            required: false,
        });
        self
    }

    /// Matches the declared columns against a header row.
    ///
    /// Fails with `ColumnNotFound` on the first required column that is absent.
    /// Optional columns that are absent are simply left out of the result.
    pub fn resolve(&self, header: &[String]) -> Result<ResolvedTable, SheetError> {
        let mut positions = HashMap::new();
        for spec in &self.columns {
            match header.iter().position(|h| h == spec.name) {
                Some(idx) => {
                    positions.insert(spec.name.to_string(), idx);
                }
                None if spec.required => {
                    return Err(SheetError::ColumnNotFound {
                        sheet: self.sheet.clone(),
                        column: spec.name.to_string(),
                    });
                }
                None => {
                    tracing::debug!(
                        "Optional column '{}' absent from sheet '{}'",
                        spec.name,
                        self.sheet
                    );
                }
            }
        }
        Ok(ResolvedTable {
            sheet: self.sheet.clone(),
            positions,
            width: header.len(),
        })
    }
}

/// Column positions of a tab as found in its header row.
#[derive(Debug, Clone)]
pub struct ResolvedTable {
    sheet: String,
    positions: HashMap<String, usize>,
    width: usize,
}

impl ResolvedTable {
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn has(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// 0-based index of a resolved column.
    pub fn index(&self, column: &str) -> Result<usize, SheetError> {
        self.positions
            .get(column)
            .copied()
            .ok_or_else(|| SheetError::ColumnNotFound {
                sheet: self.sheet.clone(),
                column: column.to_string(),
            })
    }

    pub fn letter(&self, column: &str) -> Result<String, SheetError> {
        column_letter(self.index(column)? + 1)
    }

    /// Cell value for `column`, treating empty cells as absent.
    pub fn value<'r>(&self, row: &'r FoundRow, column: &str) -> Option<&'r str> {
        self.positions
            .get(column)
            .and_then(|&idx| row.get(idx))
            .filter(|v| !v.trim().is_empty())
    }

    /// Lays out a full row in header order. Columns the tab lacks are skipped.
    pub fn build_row(&self, cells: &[(&str, String)]) -> Vec<String> {
        let mut row = vec![String::new(); self.width];
        for (column, value) in cells {
            if let Some(&idx) = self.positions.get(*column) {
                row[idx] = value.clone();
            }
        }
        row
    }
}
