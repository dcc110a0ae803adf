#[cfg(test)]
mod tests {
    use crate::address::{column_index, column_letter};
    use proptest::prelude::*;

    proptest! {
        // Letters and numbers are inverse over the whole usable range
        #[test]
        fn test_column_letter_round_trips(n in 1usize..200_000) {
            let letters = column_letter(n).unwrap();
            prop_assert_eq!(column_index(&letters).unwrap(), n);
        }

        // Only uppercase A-Z, and never a zero digit
        #[test]
        fn test_column_letter_alphabet(n in 1usize..200_000) {
            let letters = column_letter(n).unwrap();
            prop_assert!(!letters.is_empty());
            prop_assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
        }

        // Longer letter strings always address columns further right
        #[test]
        fn test_column_letter_is_monotonic(n in 1usize..200_000) {
            let a = column_letter(n).unwrap();
            let b = column_letter(n + 1).unwrap();
            prop_assert!(a.len() < b.len() || (a.len() == b.len() && a < b));
        }
    }
}
