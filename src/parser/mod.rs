//! Main XLSX parser
//!
//! Reads the workbook's relationships, sheet list and shared strings, then
//! every worksheet, out of the ZIP archive.

mod relationships;
mod worksheet;

use std::io::Cursor;
use tracing::debug;
use zip::ZipArchive;

use crate::error::Result;
use crate::types::Workbook;

use relationships::{get_sheet_info, parse_shared_strings, parse_workbook_relationships};
use worksheet::parse_sheet;

/// Parse an XLSX file from bytes.
pub fn parse(data: &[u8]) -> Result<Workbook> {
    let cursor = Cursor::new(data);
    let mut archive = ZipArchive::new(cursor)?;

    // Relationships first, to get actual part paths
    let relationships = parse_workbook_relationships(&mut archive);
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());
    let sheet_info = get_sheet_info(&mut archive, &relationships.worksheets)?;

    let mut workbook = Workbook::default();
    for info in sheet_info {
        let sheet = parse_sheet(&mut archive, &info, &shared_strings)?;
        debug!(
            sheet = %sheet.name,
            path = %info.path,
            cells = sheet.cells.len(),
            "parsed worksheet"
        );
        workbook.sheets.push(sheet);
        workbook.sheet_paths.push(info.path);
    }

    Ok(workbook)
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
    use crate::types::{CellValue, SheetState};
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/data.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/other.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>
</Relationships>"#;

    #[test]
    fn test_parse_follows_relationships() {
        let data = build(&[
            ("xl/_rels/workbook.xml.rels", RELS),
            (
                "xl/workbook.xml",
                r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>
<sheet name="Notes" sheetId="2" r:id="rId2" state="hidden"/>
<sheet name="overlap fix" sheetId="1" r:id="rId1"/>
</sheets></workbook>"#,
            ),
            (
                "xl/sharedStrings.xml",
                r#"<sst><si><t>WS-1</t></si><si><r><t>WS</t></r><r><t>-2</t></r></si></sst>"#,
            ),
            (
                "xl/worksheets/data.xml",
                r#"<worksheet><sheetData>
<row r="2"><c r="A2" t="s"><v>0</v></c><c r="B2"><v>100</v></c><c r="C2" s="3"/></row>
<row r="3" ht="30" customHeight="1"><c r="A3" t="s"><v>1</v></c><c r="B3"><f>B2+1</f><v>101</v></c></row>
</sheetData><mergeCells count="1"><mergeCell ref="G1:H1"/></mergeCells></worksheet>"#,
            ),
            (
                "xl/worksheets/other.xml",
                r#"<worksheet><sheetData/></worksheet>"#,
            ),
        ]);

        let wb = parse(&data).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Notes", "overlap fix"]);
        assert_eq!(wb.sheets[0].state, SheetState::Hidden);
        assert_eq!(wb.sheet_paths[1], "xl/worksheets/data.xml");

        let sheet = wb.sheet("overlap fix").unwrap();
        assert_eq!(sheet.value_at(1, 0), CellValue::Text("WS-1".into()));
        assert_eq!(sheet.value_at(2, 0), CellValue::Text("WS-2".into()));
        assert_eq!(sheet.value_at(1, 1), CellValue::Number(100.0));
        assert_eq!(sheet.cell(1, 2).unwrap().style_idx, Some(3));
        assert_eq!(
            sheet.cell(2, 1).unwrap().formula.as_ref().map(|f| f.text.as_str()),
            Some("B2+1")
        );
        assert_eq!(sheet.rows[0].height, Some(30.0));
        assert_eq!(sheet.merges, vec!["G1:H1".to_string()]);
        assert_eq!((sheet.max_row, sheet.max_col), (3, 3));
    }

    #[test]
    fn test_parse_without_relationships_uses_default_paths() {
        let data = build(&[
            (
                "xl/workbook.xml",
                r#"<workbook><sheets><sheet name="Sheet1" sheetId="1"/></sheets></workbook>"#,
            ),
            (
                "xl/worksheets/sheet1.xml",
                r#"<worksheet><sheetData><row><c t="inlineStr"><is><t>x</t></is></c><c><v>2</v></c></row></sheetData></worksheet>"#,
            ),
        ]);
        let wb = parse(&data).unwrap();
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.value_at(0, 0), CellValue::Text("x".into()));
        assert_eq!(sheet.value_at(0, 1), CellValue::Number(2.0));
    }

    #[test]
    fn test_parse_rejects_non_zip() {
        assert!(parse(b"not a zip").is_err());
    }

    #[test]
    fn test_missing_workbook_part() {
        let data = build(&[("docProps/app.xml", "<Properties/>")]);
        assert!(matches!(
            parse(&data).unwrap_err(),
            crate::error::OverlapFixError::Zip(_)
        ));
    }
}
