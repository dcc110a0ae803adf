// --- File: crates/sheetbook_sheets/src/adapter.rs ---
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::address::{a1_cell, column_letter};
use crate::error::SheetError;
use crate::store::{find_first, header_index, parse_count, FoundRow, Grid, RowStore};

/// Attempts made by [`RowStoreAdapter::decrement_counter`] before giving up.
pub const MAX_CAS_ATTEMPTS: u32 = 5;

/// Table-level operations over a [`RowStore`].
#[derive(Clone)]
pub struct RowStoreAdapter {
    store: Arc<dyn RowStore>,
}

impl RowStoreAdapter {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub async fn read_grid(&self, sheet: &str) -> Result<Grid, SheetError> {
        self.store.read_range(sheet).await
    }

    /// Scans data rows in order and returns the first whose `column` cell
    /// equals `target` exactly. `Ok(None)` means no row matched.
    pub async fn find_row_by_column_value(
        &self,
        sheet: &str,
        column: &str,
        target: &str,
    ) -> Result<Option<FoundRow>, SheetError> {
        self.find_row_matching_any(sheet, column, &[target]).await
    }

    /// Like [`find_row_by_column_value`](Self::find_row_by_column_value) but a
    /// row matches when its cell equals any of `targets`.
    pub async fn find_row_matching_any<S: AsRef<str> + Sync>(
        &self,
        sheet: &str,
        column: &str,
        targets: &[S],
    ) -> Result<Option<FoundRow>, SheetError> {
        let grid = self.store.read_range(sheet).await?;
        let idx = header_index(&grid, sheet, column)?;
        Ok(find_first(&grid, idx, targets))
    }

    pub async fn update_cell(
        &self,
        sheet: &str,
        row: usize,
        column: &str,
        value: &str,
    ) -> Result<(), SheetError> {
        let cell = a1_cell(sheet, row, column)?;
        debug!("Updating {} -> '{}'", cell, value);
        self.store.update_cell(sheet, row, column, value).await
    }

    pub async fn append_row(&self, sheet: &str, values: Vec<String>) -> Result<(), SheetError> {
        debug!("Appending row to '{}' ({} cells)", sheet, values.len());
        self.store.append_row(sheet, values).await
    }

    /// Decrements an integer counter cell on the row keyed by `key`, flooring at 0.
    ///
    /// Unparseable or blank counters are read as 0, so an oversold row stays at
    /// 0 rather than failing. Each write is conditional on the cell still holding
    /// the value just read; a lost race re-reads and retries.
    pub async fn decrement_counter(
        &self,
        sheet: &str,
        key_column: &str,
        key: &str,
        counter_column: &str,
    ) -> Result<i64, SheetError> {
        let mut last_cell = String::new();
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let grid = self.store.read_range(sheet).await?;
            let key_idx = header_index(&grid, sheet, key_column)?;
            let counter_idx = header_index(&grid, sheet, counter_column)?;
            let row = find_first(&grid, key_idx, &[key]).ok_or_else(|| SheetError::RowNotFound {
                sheet: sheet.to_string(),
                column: key_column.to_string(),
                value: key.to_string(),
            })?;

            let raw = row.get(counter_idx).unwrap_or("");
            let current = parse_count(Some(raw));
            let next = (current - 1).max(0);
            let letter = column_letter(counter_idx + 1)?;
            last_cell = a1_cell(sheet, row.row_number, &letter)?;

            if current <= 0 {
                warn!(
                    "Counter {} for '{}' is already at {} (raw '{}'); writing 0",
                    last_cell, key, current, raw
                );
            }

            let written = self
                .store
                .compare_and_set_cell(sheet, row.row_number, &letter, raw, &next.to_string())
                .await?;
            if written {
                info!("Counter {} for '{}': {} -> {}", last_cell, key, current, next);
                return Ok(next);
            }
            debug!(
                "Counter {} changed under us (attempt {}/{}), retrying",
                last_cell, attempt, MAX_CAS_ATTEMPTS
            );
        }
        Err(SheetError::Conflict {
            cell: last_cell,
            attempts: MAX_CAS_ATTEMPTS,
        })
    }
}
