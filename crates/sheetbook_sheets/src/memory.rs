// --- File: crates/sheetbook_sheets/src/memory.rs ---
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use sheetbook_common::BoxFuture;

use crate::address::{a1_cell, column_index};
use crate::error::SheetError;
use crate::store::{Grid, RowStore};

/// In-process row store.
///
/// Every operation holds one lock for its whole duration, so compare-and-set
/// is atomic with respect to all other writers.
#[derive(Default)]
pub struct InMemoryRowStore {
    sheets: Mutex<HashMap<String, Grid>>,
    fail_writes: AtomicBool,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a tab with the given rows, header first.
    pub fn with_sheet<R, C>(self, name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let grid: Grid = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.lock().insert(name.to_string(), grid);
        self
    }

    /// Snapshot of a tab.
    pub fn sheet(&self, name: &str) -> Option<Grid> {
        self.lock().get(name).cloned()
    }

    /// Makes every subsequent write fail with `WriteError`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Grid>> {
        // A poisoned map is still structurally valid.
        self.sheets.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self, target: &str) -> Result<(), SheetError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SheetError::WriteError {
                target: target.to_string(),
                message: "store is rejecting writes".to_string(),
            });
        }
        Ok(())
    }

    fn cell_mut<'g>(
        grid: &'g mut Grid,
        row: usize,
        column: &str,
    ) -> Result<&'g mut String, SheetError> {
        let col = column_index(column)? - 1;
        if grid.len() < row {
            grid.resize_with(row, Vec::new);
        }
        let cells = &mut grid[row - 1];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        Ok(&mut cells[col])
    }
}

fn missing_sheet(sheet: &str) -> SheetError {
    SheetError::ApiError {
        status_code: 400,
        message: format!("Unable to parse range: {}", sheet),
    }
}

impl RowStore for InMemoryRowStore {
    fn read_range<'a>(&'a self, sheet: &'a str) -> BoxFuture<'a, Grid, SheetError> {
        let result = self.sheet(sheet).ok_or_else(|| missing_sheet(sheet));
        Box::pin(async move { result })
    }

    fn update_cell<'a>(
        &'a self,
        sheet: &'a str,
        row: usize,
        column: &'a str,
        value: &'a str,
    ) -> BoxFuture<'a, (), SheetError> {
        Box::pin(async move {
            let cell = a1_cell(sheet, row, column)?;
            self.check_writable(&cell)?;
            let mut sheets = self.lock();
            let grid = sheets.get_mut(sheet).ok_or_else(|| missing_sheet(sheet))?;
            *Self::cell_mut(grid, row, column)? = value.to_string();
            Ok(())
        })
    }

    fn append_row<'a>(
        &'a self,
        sheet: &'a str,
        values: Vec<String>,
    ) -> BoxFuture<'a, (), SheetError> {
        Box::pin(async move {
            self.check_writable(sheet)?;
            let mut sheets = self.lock();
            let grid = sheets.get_mut(sheet).ok_or_else(|| missing_sheet(sheet))?;
            grid.push(values);
            Ok(())
        })
    }

    fn compare_and_set_cell<'a>(
        &'a self,
        sheet: &'a str,
        row: usize,
        column: &'a str,
        expected: &'a str,
        new: &'a str,
    ) -> BoxFuture<'a, bool, SheetError> {
        Box::pin(async move {
            let cell = a1_cell(sheet, row, column)?;
            self.check_writable(&cell)?;
            let mut sheets = self.lock();
            let grid = sheets.get_mut(sheet).ok_or_else(|| missing_sheet(sheet))?;
            let slot = Self::cell_mut(grid, row, column)?;
            if slot.as_str() != expected {
                return Ok(false);
            }
            *slot = new.to_string();
            Ok(true)
        })
    }
}
