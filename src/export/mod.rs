//! Writing a resolved workbook back out.
//!
//! The target worksheet part is regenerated from its `Sheet`; every other
//! ZIP entry is copied through raw.

pub(crate) mod sheet_writer;
pub(crate) mod zip_patcher;

use crate::error::{OverlapFixError, Result};
use crate::types::Workbook;

/// Rebuild `original` with the worksheet at `sheet_idx` replaced by the
/// current contents of `workbook.sheets[sheet_idx]`.
pub fn save_sheet(original: &[u8], workbook: &Workbook, sheet_idx: usize) -> Result<Vec<u8>> {
    let (Some(sheet), Some(path)) = (
        workbook.sheets.get(sheet_idx),
        workbook.sheet_paths.get(sheet_idx),
    ) else {
        return Err(OverlapFixError::Parse(format!(
            "no worksheet part for sheet index {sheet_idx}"
        )));
    };
    zip_patcher::replace_part(original, path, sheet_writer::write_sheet_xml(sheet).as_bytes())
}
