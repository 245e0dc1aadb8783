use serde::Serialize;

use super::{Cell, CellData, CellValue, Formula};
use crate::cell_ref::CellRange;
use crate::table::Table;

/// The worksheets of an XLSX file, in workbook order.
#[derive(Debug, Default, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    /// ZIP entry of each sheet, parallel to `sheets` (needed to patch on save).
    #[serde(skip)]
    pub(crate) sheet_paths: Vec<String>,
}

impl Workbook {
    /// Index of the sheet with exactly this name.
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Sheet visibility state
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SheetState {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

/// A `<col>` element, kept as written (1-based, inclusive span).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnDef {
    pub min: u32,
    pub max: u32,
    pub width: Option<f64>,
    pub style: Option<u32>,
    pub custom_width: bool,
    pub hidden: bool,
}

/// Row attributes worth carrying through a save.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowDef {
    pub row: u32, // 0-indexed
    /// Height in points.
    pub height: Option<f64>,
    pub hidden: bool,
}

/// A single worksheet
#[derive(Clone, Debug, Default, Serialize)]
pub struct Sheet {
    pub name: String,
    pub state: SheetState,
    /// Sparse cells, sorted by (row, col).
    pub cells: Vec<CellData>,
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<RowDef>,
    /// Merge ranges as written, e.g. "A1:B2".
    pub merges: Vec<String>,
    pub default_row_height: Option<f64>,
    /// One past the last used row/column (0 when the sheet is empty).
    pub max_row: u32,
    pub max_col: u32,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Restore (row, col) order and recompute the used extent.
    pub(crate) fn normalize(&mut self) {
        self.cells.sort_by_key(|cd| (cd.r, cd.c));
        self.cells.dedup_by_key(|cd| (cd.r, cd.c));
        self.rows.sort_by_key(|rd| rd.row);
        self.max_row = self.cells.iter().map(|cd| cd.r + 1).max().unwrap_or(0);
        self.max_col = self.cells.iter().map(|cd| cd.c + 1).max().unwrap_or(0);
    }

    fn cell_position(&self, row: u32, col: u32) -> std::result::Result<usize, usize> {
        self.cells.binary_search_by_key(&(row, col), |cd| (cd.r, cd.c))
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        let idx = self.cell_position(row, col).ok()?;
        self.cells.get(idx).map(|cd| &cd.cell)
    }

    pub fn value_at(&self, row: u32, col: u32) -> CellValue {
        self.cell(row, col)
            .map(|cell| cell.value.clone())
            .unwrap_or_default()
    }

    /// Copy a rectangular block of values out of the sheet.
    pub fn table(&self, range: &CellRange) -> Table {
        let rows = (range.start_row..=range.end_row)
            .map(|r| {
                (range.start_col..=range.end_col)
                    .map(|c| self.value_at(r, c))
                    .collect()
            })
            .collect();
        Table::new(rows)
    }

    /// Overwrite (or create) a cell with a plain number. The cell's style is
    /// kept; any formula is dropped.
    ///
    /// Dropping the master of a shared formula group leaves its followers
    /// without text to refer to, so they fall back to their cached values.
    pub fn set_number(&mut self, row: u32, col: u32, value: f64) {
        match self.cell_position(row, col) {
            Ok(idx) => {
                let dropped = self.cells.get_mut(idx).and_then(|cd| {
                    cd.cell.value = CellValue::Number(value);
                    cd.cell.formula.take()
                });
                if let Some(si) = dropped.as_ref().and_then(shared_master_index) {
                    self.detach_shared_group(si);
                }
            }
            Err(idx) => {
                self.cells.insert(
                    idx,
                    CellData {
                        r: row,
                        c: col,
                        cell: Cell {
                            value: CellValue::Number(value),
                            style_idx: None,
                            formula: None,
                        },
                    },
                );
            }
        }
        self.max_row = self.max_row.max(row + 1);
        self.max_col = self.max_col.max(col + 1);
    }

    fn detach_shared_group(&mut self, si: u32) {
        for cd in &mut self.cells {
            let in_group = cd.cell.formula.as_ref().is_some_and(|f| {
                f.kind.as_deref() == Some("shared") && f.shared_index == Some(si)
            });
            if in_group {
                cd.cell.formula = None;
            }
        }
    }
}

/// Group index of a shared formula master (the cell carrying the text).
fn shared_master_index(formula: &Formula) -> Option<u32> {
    if formula.kind.as_deref() == Some("shared") && !formula.text.is_empty() {
        formula.shared_index
    } else {
        None
    }
}
