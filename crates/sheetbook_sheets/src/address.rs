// --- File: crates/sheetbook_sheets/src/address.rs ---
//! A1 addressing helpers.
//!
//! Columns use bijective base-26 letters: `A` is 1, `Z` is 26, `AA` is 27.
//! Rows are 1-based sheet rows, so the header lives on row 1.

use crate::error::SheetError;

/// Converts a 1-based column number to its letter form (`28` -> `"AB"`).
pub fn column_letter(index: usize) -> Result<String, SheetError> {
    if index == 0 {
        return Err(SheetError::InvalidAddress(
            "column numbers start at 1".to_string(),
        ));
    }
    let mut n = index;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    Ok(letters.into_iter().map(char::from).collect())
}

/// Converts a column letter string back to its 1-based number (`"AB"` -> `28`).
///
/// Lowercase letters are accepted.
pub fn column_index(letters: &str) -> Result<usize, SheetError> {
    if letters.is_empty() {
        return Err(SheetError::InvalidAddress("empty column letters".to_string()));
    }
    letters.chars().try_fold(0usize, |acc, c| {
        if !c.is_ascii_alphabetic() {
            return Err(SheetError::InvalidAddress(format!(
                "invalid column letters '{}'",
                letters
            )));
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc.checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| {
                SheetError::InvalidAddress(format!("column letters '{}' overflow", letters))
            })
    })
}

/// Quotes a sheet name for use in an A1 reference when it contains anything
/// other than ASCII letters, digits or underscores.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Builds a single-cell A1 reference such as `Events!H3` or `'Sign Ups'!B2`.
pub fn a1_cell(sheet: &str, row: usize, column: &str) -> Result<String, SheetError> {
    if row == 0 {
        return Err(SheetError::InvalidAddress(format!(
            "row numbers start at 1 (got {}{})",
            column, row
        )));
    }
    let normalized = column_letter(column_index(column)?)?;
    Ok(format!("{}!{}{}", quote_sheet_name(sheet), normalized, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_column_letters() {
        assert_eq!(column_letter(1).unwrap(), "A");
        assert_eq!(column_letter(26).unwrap(), "Z");
        assert_eq!(column_letter(27).unwrap(), "AA");
        assert_eq!(column_letter(28).unwrap(), "AB");
        assert_eq!(column_letter(702).unwrap(), "ZZ");
        assert_eq!(column_letter(703).unwrap(), "AAA");
        assert!(column_letter(0).is_err());
    }

    #[test]
    fn test_column_index_rejects_garbage() {
        assert_eq!(column_index("h").unwrap(), 8);
        assert!(column_index("").is_err());
        assert!(column_index("B2").is_err());
    }

    #[test]
    fn test_a1_cell_quotes_when_needed() {
        assert_eq!(a1_cell("Events", 3, "H").unwrap(), "Events!H3");
        assert_eq!(a1_cell("Sign Ups", 2, "b").unwrap(), "'Sign Ups'!B2");
        assert_eq!(a1_cell("Bob's", 1, "A").unwrap(), "'Bob''s'!A1");
        assert!(a1_cell("Events", 0, "A").is_err());
    }
}
