//! Generates worksheet XML from a `Sheet` struct.
//!
//! Rewritten sheets use inline strings (`t="inlineStr"`) instead of shared
//! string references, avoiding the need to rebuild the shared string table.

use std::fmt::Write as _;

use crate::cell_ref::{cell_ref_string, col_to_letter};
use crate::types::{Cell, CellData, CellValue, Formula, Sheet};
use crate::xml_helpers::xml_escape;

/// Write a complete worksheet XML string from a `Sheet`.
pub(crate) fn write_sheet_xml(sheet: &Sheet) -> String {
    let mut out = String::with_capacity(256 + sheet.cells.len() * 48);
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
    );
    out.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    out.push('\n');

    // <dimension>
    if sheet.max_row > 0 && sheet.max_col > 0 {
        let _ = writeln!(
            out,
            "<dimension ref=\"A1:{}{}\"/>",
            col_to_letter(sheet.max_col - 1),
            sheet.max_row
        );
    }

    // <sheetFormatPr>
    if let Some(height) = sheet.default_row_height {
        let _ = writeln!(out, "<sheetFormatPr defaultRowHeight=\"{height}\"/>");
    }

    // <cols>
    if !sheet.columns.is_empty() {
        out.push_str("<cols>\n");
        for col in &sheet.columns {
            let _ = write!(out, "<col min=\"{}\" max=\"{}\"", col.min, col.max);
            if let Some(width) = col.width {
                let _ = write!(out, " width=\"{width}\"");
            }
            if let Some(style) = col.style {
                let _ = write!(out, " style=\"{style}\"");
            }
            if col.custom_width {
                out.push_str(" customWidth=\"1\"");
            }
            if col.hidden {
                out.push_str(" hidden=\"1\"");
            }
            out.push_str("/>\n");
        }
        out.push_str("</cols>\n");
    }

    // <sheetData>
    out.push_str("<sheetData>\n");
    write_sheet_data(&mut out, sheet);
    out.push_str("</sheetData>\n");

    // <mergeCells>
    if !sheet.merges.is_empty() {
        let _ = writeln!(out, "<mergeCells count=\"{}\">", sheet.merges.len());
        for merge in &sheet.merges {
            let _ = writeln!(out, "<mergeCell ref=\"{}\"/>", xml_escape(merge));
        }
        out.push_str("</mergeCells>\n");
    }

    out.push_str("</worksheet>");
    out
}

/// Write all rows into `<sheetData>`, including rows that only carry a
/// height or hidden flag.
fn write_sheet_data(out: &mut String, sheet: &Sheet) {
    let mut row_defs = sheet.rows.iter().peekable();
    let mut cells = sheet.cells.iter().peekable();

    loop {
        let next_cell_row = cells.peek().map(|cd| cd.r);
        let next_def_row = row_defs.peek().map(|rd| rd.row);
        let row = match (next_cell_row, next_def_row) {
            (Some(c), Some(d)) => c.min(d),
            (Some(c), None) => c,
            (None, Some(d)) => d,
            (None, None) => break,
        };

        let _ = write!(out, "<row r=\"{}\"", u64::from(row) + 1);
        if let Some(def) = row_defs.next_if(|rd| rd.row == row) {
            if let Some(height) = def.height {
                let _ = write!(out, " ht=\"{height}\" customHeight=\"1\"");
            }
            if def.hidden {
                out.push_str(" hidden=\"1\"");
            }
        }
        out.push('>');

        while let Some(cd) = cells.next_if(|cd| cd.r == row) {
            write_cell(out, cd);
        }

        out.push_str("</row>\n");
    }
}

/// Write a single `<c>` element.
fn write_cell(out: &mut String, cd: &CellData) {
    let Cell {
        value,
        style_idx,
        formula,
    } = &cd.cell;

    let _ = write!(out, "<c r=\"{}\"", cell_ref_string(cd.c, cd.r));

    // Style index
    if let Some(si) = style_idx {
        let _ = write!(out, " s=\"{si}\"");
    }

    let formula_xml = formula.as_ref().map(formula_element).unwrap_or_default();

    match value {
        CellValue::Empty => {
            if formula_xml.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            out.push_str(&formula_xml);
        }
        CellValue::Number(n) => {
            out.push('>');
            out.push_str(&formula_xml);
            let _ = write!(out, "<v>{n}</v>");
        }
        CellValue::Text(s) if formula.is_some() => {
            // Formula result string
            out.push_str(" t=\"str\">");
            out.push_str(&formula_xml);
            let _ = write!(out, "<v>{}</v>", xml_escape(s));
        }
        CellValue::Text(s) => {
            // Use inline string to avoid shared string table rebuild
            let _ = write!(
                out,
                " t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is>",
                xml_escape(s)
            );
        }
        CellValue::Bool(b) => {
            out.push_str(" t=\"b\">");
            out.push_str(&formula_xml);
            let _ = write!(out, "<v>{}</v>", u8::from(*b));
        }
        CellValue::Error(e) => {
            out.push_str(" t=\"e\">");
            out.push_str(&formula_xml);
            let _ = write!(out, "<v>{}</v>", xml_escape(e));
        }
    }

    out.push_str("</c>");
}

/// The `<f>` element, self-closing for shared followers that carry no text.
fn formula_element(formula: &Formula) -> String {
    let mut xml = String::from("<f");
    if let Some(kind) = &formula.kind {
        let _ = write!(xml, " t=\"{}\"", xml_escape(kind));
    }
    if let Some(range) = &formula.range {
        let _ = write!(xml, " ref=\"{}\"", xml_escape(range));
    }
    if let Some(si) = formula.shared_index {
        let _ = write!(xml, " si=\"{si}\"");
    }
    if formula.text.is_empty() {
        xml.push_str("/>");
    } else {
        let _ = write!(xml, ">{}</f>", xml_escape(&formula.text));
    }
    xml
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
    use crate::types::RowDef;

    fn cell(r: u32, c: u32, value: CellValue) -> CellData {
        CellData {
            r,
            c,
            cell: Cell {
                value,
                ..Cell::default()
            },
        }
    }

    #[test]
    fn test_write_cells_by_type() {
        let mut sheet = Sheet::new("s");
        sheet.cells = vec![
            cell(0, 0, CellValue::Text("R&D".into())),
            cell(0, 1, CellValue::Number(42.5)),
            cell(1, 0, CellValue::Bool(true)),
            cell(1, 1, CellValue::Error("#N/A".into())),
        ];
        sheet.normalize();
        let xml = write_sheet_xml(&sheet);
        assert!(xml.contains(r#"<dimension ref="A1:B2"/>"#));
        assert!(xml.contains(
            r#"<c r="A1" t="inlineStr"><is><t xml:space="preserve">R&amp;D</t></is></c>"#
        ));
        assert!(xml.contains(r#"<c r="B1"><v>42.5</v></c>"#));
        assert!(xml.contains(r#"<c r="A2" t="b"><v>1</v></c>"#));
        assert!(xml.contains(r#"<c r="B2" t="e"><v>#N/A</v></c>"#));
    }

    #[test]
    fn test_write_style_and_formula() {
        let mut sheet = Sheet::new("s");
        sheet.cells = vec![
            CellData {
                r: 0,
                c: 2,
                cell: Cell {
                    value: CellValue::Number(3.0),
                    style_idx: Some(2),
                    formula: Some(Formula::new("A1+B1")),
                },
            },
            CellData {
                r: 0,
                c: 3,
                cell: Cell {
                    value: CellValue::Empty,
                    style_idx: Some(5),
                    formula: None,
                },
            },
        ];
        let xml = write_sheet_xml(&sheet);
        assert!(xml.contains(r#"<c r="C1" s="2"><f>A1+B1</f><v>3</v></c>"#));
        assert!(xml.contains(r#"<c r="D1" s="5"/>"#));
    }

    #[test]
    fn test_write_shared_formula_group() {
        let shared = |text: &str, range: Option<&str>| Formula {
            text: text.to_string(),
            kind: Some("shared".to_string()),
            range: range.map(str::to_string),
            shared_index: Some(0),
        };
        let mut sheet = Sheet::new("s");
        sheet.cells = vec![
            CellData {
                r: 1,
                c: 12,
                cell: Cell {
                    value: CellValue::Number(100.0),
                    formula: Some(shared("B2*2", Some("M2:M3"))),
                    ..Cell::default()
                },
            },
            CellData {
                r: 2,
                c: 12,
                cell: Cell {
                    value: CellValue::Number(100.0),
                    formula: Some(shared("", None)),
                    ..Cell::default()
                },
            },
        ];
        let xml = write_sheet_xml(&sheet);
        assert!(xml.contains(
            r#"<c r="M2"><f t="shared" ref="M2:M3" si="0">B2*2</f><v>100</v></c>"#
        ));
        assert!(xml.contains(r#"<c r="M3"><f t="shared" si="0"/><v>100</v></c>"#));
    }

    #[test]
    fn test_rows_without_cells_keep_attributes() {
        let mut sheet = Sheet::new("s");
        sheet.cells = vec![cell(3, 0, CellValue::Number(1.0))];
        sheet.rows = vec![
            RowDef {
                row: 1,
                height: Some(30.0),
                hidden: false,
            },
            RowDef {
                row: 3,
                height: None,
                hidden: true,
            },
        ];
        let xml = write_sheet_xml(&sheet);
        let r2 = xml.find(r#"<row r="2" ht="30" customHeight="1"></row>"#).unwrap();
        let r4 = xml.find(r#"<row r="4" hidden="1"><c r="A4"><v>1</v></c></row>"#).unwrap();
        assert!(r2 < r4);
    }

    #[test]
    fn test_empty_sheet() {
        let xml = write_sheet_xml(&Sheet::new("blank"));
        assert!(!xml.contains("<dimension"));
        assert!(xml.contains("<sheetData>\n</sheetData>"));
    }
}
