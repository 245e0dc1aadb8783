//! Utilities for parsing Excel-style cell references and ranges.

use crate::error::{OverlapFixError, Result};

/// Parse a cell reference like "A1" into (col, row) where col and row are 0-indexed.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Parse a cell reference from raw bytes (ASCII) into (col, row) where col and row are 0-indexed.
///
/// This is the bytes equivalent of [`parse_cell_ref`] for use when working with
/// raw XML attribute values (e.g., `attr.value` from quick-xml). Letters must
/// precede digits; anything else is rejected.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .checked_mul(26)?
                .checked_add(u32::from(upper - b'A') + 1)?;
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some((col - 1, row - 1))
}

/// Convert a 0-based column index to Excel column letters (A, B, ..., Z, AA, AB, ...)
pub fn col_to_letter(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = u64::from(col) + 1;
    while n > 0 {
        n -= 1;
        let rem = u8::try_from(n % 26).unwrap_or(0);
        letters.push(char::from(b'A' + rem));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// Format a 0-based (col, row) pair as an A1 reference.
pub fn cell_ref_string(col: u32, row: u32) -> String {
    format!("{}{}", col_to_letter(col), u64::from(row) + 1)
}

/// An inclusive rectangular block of cells, 0-indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl CellRange {
    /// Parse "A2:E10" (or a single cell "B3"). Corners may be given in any order.
    pub fn parse(range: &str) -> Result<Self> {
        let (start, end) = range.split_once(':').unwrap_or((range, range));
        let bad = || OverlapFixError::CellRef(range.to_string());
        let (c1, r1) = parse_cell_ref(start).ok_or_else(bad)?;
        let (c2, r2) = parse_cell_ref(end).ok_or_else(bad)?;
        Ok(Self {
            start_row: r1.min(r2),
            start_col: c1.min(c2),
            end_row: r1.max(r2),
            end_col: c1.max(c2),
        })
    }

    pub fn rows(&self) -> usize {
        (self.end_row - self.start_row) as usize + 1
    }

    pub fn cols(&self) -> usize {
        (self.end_col - self.start_col) as usize + 1
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.start_row..=self.end_row).contains(&row)
            && (self.start_col..=self.end_col).contains(&col)
    }
}

impl std::fmt::Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            cell_ref_string(self.start_col, self.start_row),
            cell_ref_string(self.end_col, self.end_row)
        )
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A1", Some((0, 0)); "origin")]
    #[test_case("J2", Some((9, 1)); "output start")]
    #[test_case("$E$10", Some((4, 9)); "absolute")]
    #[test_case("aa3", Some((26, 2)); "lowercase two letters")]
    #[test_case("A0", None; "row zero")]
    #[test_case("12", None; "no column")]
    #[test_case("B", None; "no row")]
    #[test_case("1A", None; "digits first")]
    #[test_case("A-1", None; "junk")]
    fn test_parse_cell_ref(input: &str, expected: Option<(u32, u32)>) {
        assert_eq!(parse_cell_ref(input), expected);
    }

    #[test_case(0, "A")]
    #[test_case(25, "Z")]
    #[test_case(26, "AA")]
    #[test_case(701, "ZZ")]
    #[test_case(702, "AAA")]
    fn test_col_to_letter(col: u32, expected: &str) {
        assert_eq!(col_to_letter(col), expected);
    }

    #[test]
    fn test_range_parse_and_display() {
        let range = CellRange::parse("A2:E10").unwrap();
        assert_eq!(range.rows(), 9);
        assert_eq!(range.cols(), 5);
        assert_eq!(range.to_string(), "A2:E10");
        assert!(range.contains(1, 0));
        assert!(!range.contains(0, 0));
    }

    #[test]
    fn test_range_normalizes_corners() {
        let range = CellRange::parse("K10:J2").unwrap();
        assert_eq!(range, CellRange::parse("J2:K10").unwrap());
        assert_eq!(range.cols(), 2);
    }

    #[test]
    fn test_single_cell_range() {
        let range = CellRange::parse("C3").unwrap();
        assert_eq!((range.rows(), range.cols()), (1, 1));
    }

    #[test]
    fn test_bad_range() {
        let err = CellRange::parse("A2:??").unwrap_err();
        assert!(matches!(err, OverlapFixError::CellRef(_)));
    }
}
