//! In-memory tabular data and the mapping between table rows and workstations.
//!
//! Every adapter (XLSX range, CSV file) first produces a [`Table`]; the rows
//! are then turned into [`Workstation`]s here, so the validation rules are the
//! same whatever the source.

use crate::config::INPUT_COLUMNS;
use crate::error::{OverlapFixError, Result};
use crate::types::{CellValue, Workstation};

static EMPTY: CellValue = CellValue::Empty;

/// Row-major grid of cells. Rows may be ragged; missing cells read as empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// Workstations loaded from a table, with the table row each one came from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StationRows {
    pub offsets: Vec<usize>,
    pub stations: Vec<Workstation>,
}

const FIELD_NAMES: [&str; INPUT_COLUMNS] = ["name", "x", "y", "length", "width"];

/// Turn `(name, x, y, length, width)` rows into workstations.
///
/// Fully blank rows are skipped. Any other row must carry four numeric fields;
/// the first one that doesn't aborts the whole load.
pub fn load_workstations(table: &Table) -> Result<StationRows> {
    let mut loaded = StationRows::default();

    for (offset, row) in table.rows().iter().enumerate() {
        if row.iter().take(INPUT_COLUMNS).all(CellValue::is_empty) {
            continue;
        }

        let mut numbers = [0.0_f64; 4];
        for (slot, (col, field)) in numbers
            .iter_mut()
            .zip(FIELD_NAMES.iter().enumerate().skip(1))
        {
            let cell = table.get(offset, col);
            *slot = cell.as_number().ok_or_else(|| {
                OverlapFixError::config(format!(
                    "row {}: column '{field}' is not numeric ({})",
                    offset + 1,
                    cell.describe()
                ))
            })?;
        }
        let [x, y, length, width] = numbers;

        let name = match table.get(offset, 0) {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Empty | CellValue::Error(_) => String::new(),
        };

        loaded.offsets.push(offset);
        loaded.stations.push(Workstation::new(name, x, y, length, width));
    }

    Ok(loaded)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn row(name: &str, nums: [f64; 4]) -> Vec<CellValue> {
        let mut r = vec![text(name)];
        r.extend(nums.iter().map(|n| CellValue::Number(*n)));
        r
    }

    #[test]
    fn test_load_rows() {
        let table = Table::new(vec![
            row("WS-1", [100.0, 200.0, 120.0, 60.0]),
            row("WS-2", [150.0, 210.0, 120.0, 60.0]),
        ]);
        let loaded = load_workstations(&table).unwrap();
        assert_eq!(loaded.offsets, vec![0, 1]);
        assert_eq!(loaded.stations[1].name, "WS-2");
        assert_eq!(loaded.stations[1].length, 120.0);
        assert_eq!(loaded.stations[1].width, 60.0);
    }

    #[test]
    fn test_blank_rows_skipped_but_offsets_kept() {
        let table = Table::new(vec![
            row("a", [1.0, 1.0, 1.0, 1.0]),
            vec![CellValue::Empty, text("  ")],
            Vec::new(),
            row("b", [5.0, 5.0, 1.0, 1.0]),
        ]);
        let loaded = load_workstations(&table).unwrap();
        assert_eq!(loaded.offsets, vec![0, 3]);
        assert_eq!(loaded.stations.len(), 2);
    }

    #[test]
    fn test_numeric_text_accepted() {
        let table = Table::new(vec![vec![
            CellValue::Number(7.0),
            text(" 12.5"),
            text("3"),
            text("4"),
            text("1e1"),
        ]]);
        let ws = &load_workstations(&table).unwrap().stations[0];
        assert_eq!(ws.name, "7");
        assert_eq!((ws.x, ws.y, ws.length, ws.width), (12.5, 3.0, 4.0, 10.0));
    }

    #[test]
    fn test_non_numeric_field_names_row_and_column() {
        let mut bad = row("ws", [1.0, 1.0, 1.0, 1.0]);
        bad[3] = text("wide");
        let table = Table::new(vec![row("ok", [1.0, 1.0, 1.0, 1.0]), bad]);
        let err = load_workstations(&table).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Configuration error: row 2: column 'length' is not numeric ('wide')"
        );
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let table = Table::new(vec![vec![text("half"), CellValue::Number(1.0)]]);
        let err = load_workstations(&table).unwrap_err();
        assert!(err.to_string().contains("column 'y' is not numeric (empty)"));
    }

    #[test]
    fn test_bool_and_error_cells_rejected() {
        let mut r = row("ws", [1.0, 1.0, 1.0, 1.0]);
        r[1] = CellValue::Bool(true);
        assert!(load_workstations(&Table::new(vec![r])).is_err());

        let mut r = row("ws", [1.0, 1.0, 1.0, 1.0]);
        r[4] = CellValue::Error("#REF!".to_string());
        assert!(load_workstations(&Table::new(vec![r]))
            .unwrap_err()
            .to_string()
            .contains("#REF!"));
    }
}
