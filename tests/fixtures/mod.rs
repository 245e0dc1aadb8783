//! Test fixtures for generating valid XLSX files in memory.
//!
//! Builds workbooks programmatically so layout tests control every cell.
//!
//! # Example
//!
//! ```rust
//! use fixtures::{SheetBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("overlap fix")
//!             .cell("A2", "WS-1")
//!             .cell("B2", 50.0),
//!     )
//!     .build();
//!
//! let workbook = overlap_fix::parser::parse(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

// ============================================================================
// Cell Value
// ============================================================================

/// Represents a cell value that can be added to a sheet.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// A shared string.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// An inline string (not shared).
    InlineString(String),
    /// An empty cell (style only).
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

/// A cell in the sheet.
#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<u32>,
    /// The complete `<f>` element, written ahead of `<v>`.
    pub formula: Option<String>,
}

/// Builder for one worksheet.
#[derive(Debug, Clone)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub row_heights: Vec<(u32, f64)>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: Vec::new(),
            merges: Vec::new(),
            row_heights: Vec::new(),
        }
    }

    /// Add a cell with a value.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(mut self, cell_ref: &str, value: V) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style: None,
            formula: None,
        });
        self
    }

    /// Add an empty cell carrying only a style index.
    #[must_use]
    pub fn styled_cell(mut self, cell_ref: &str, style: u32) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Empty,
            style: Some(style),
            formula: None,
        });
        self
    }

    /// Add a numeric formula cell with a cached result.
    #[must_use]
    pub fn formula(mut self, cell_ref: &str, formula: &str, cached: f64) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Number(cached),
            style: None,
            formula: Some(format!("<f>{}</f>", escape_xml(formula))),
        });
        self
    }

    /// Add a member of shared formula group `si`. The master passes the
    /// formula text and the range it covers; followers pass `None` for both.
    #[must_use]
    pub fn shared_formula(
        mut self,
        cell_ref: &str,
        si: u32,
        master: Option<(&str, &str)>,
        cached: f64,
    ) -> Self {
        let element = match master {
            Some((range, formula)) => format!(
                r#"<f t="shared" ref="{range}" si="{si}">{}</f>"#,
                escape_xml(formula)
            ),
            None => format!(r#"<f t="shared" si="{si}"/>"#),
        };
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Number(cached),
            style: None,
            formula: Some(element),
        });
        self
    }

    /// Add one workstation row (name, x, y, length, width) in columns A..E.
    #[must_use]
    pub fn station(self, row: u32, name: &str, x: f64, y: f64, length: f64, width: f64) -> Self {
        self.cell(&format!("A{row}"), name)
            .cell(&format!("B{row}"), x)
            .cell(&format!("C{row}"), y)
            .cell(&format!("D{row}"), length)
            .cell(&format!("E{row}"), width)
    }

    /// Add the header row the layout sheets usually carry.
    #[must_use]
    pub fn header(self) -> Self {
        self.cell("A1", "Name")
            .cell("B1", "X")
            .cell("C1", "Y")
            .cell("D1", "Length")
            .cell("E1", "Width")
            .cell("J1", "New X")
            .cell("K1", "New Y")
    }

    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push((row, height));
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for creating complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    extra_parts: Vec<(String, String)>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Add an arbitrary part (e.g. `docProps/app.xml`) to the archive.
    #[must_use]
    pub fn part(mut self, name: &str, body: &str) -> Self {
        self.extra_parts.push((name.to_string(), body.to_string()));
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut write = |name: &str, body: &str| {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        write(
            "[Content_Types].xml",
            &generate_content_types(self.sheets.len()),
        );
        write("_rels/.rels", RELS);
        write(
            "xl/_rels/workbook.xml.rels",
            &generate_workbook_rels(self.sheets.len()),
        );
        write("xl/workbook.xml", &generate_workbook(&self.sheets));
        write("xl/styles.xml", STYLES);
        write(
            "xl/sharedStrings.xml",
            &generate_shared_strings(&shared_strings),
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            write(
                &format!("xl/worksheets/sheet{}.xml", i + 1),
                &generate_sheet_xml(sheet, &shared_strings),
            );
        }
        for (name, body) in &self.extra_parts {
            write(name, body);
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }
}

// ============================================================================
// Archive inspection
// ============================================================================

/// Read one part of an XLSX archive as text.
#[must_use]
pub fn read_part(xlsx: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(xlsx)).unwrap();
    let mut file = archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing part {name}"));
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

/// Names of all parts in an XLSX archive, in archive order.
#[must_use]
pub fn part_names(xlsx: &[u8]) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(xlsx)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

// ============================================================================
// XML generation
// ============================================================================

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="1"><fill><patternFill patternType="none"/></fill></fills><borders count="1"><border/></borders><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/><xf numFmtId="2" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    let styles = sheet_count + 1;
    let strings = sheet_count + 2;
    xml.push_str(&format!(
        r#"<Relationship Id="rId{styles}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId{strings}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn generate_sheet_xml(sheet: &SheetBuilder, shared_strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    xml.push_str("<sheetData>");

    // Group cells by row, columns in insertion order
    let mut rows: std::collections::BTreeMap<u32, Vec<&CellEntry>> =
        std::collections::BTreeMap::new();
    for cell in &sheet.cells {
        rows.entry(row_of(&cell.cell_ref)).or_default().push(cell);
    }
    for &(row, _) in &sheet.row_heights {
        rows.entry(row).or_default();
    }

    for (row_num, cells) in rows {
        xml.push_str(&format!(r#"<row r="{row_num}""#));
        if let Some((_, ht)) = sheet.row_heights.iter().find(|(r, _)| *r == row_num) {
            xml.push_str(&format!(r#" ht="{ht}" customHeight="1""#));
        }
        xml.push('>');

        for cell in cells {
            let mut attrs = format!(r#"r="{}""#, cell.cell_ref);
            if let Some(s) = cell.style {
                attrs.push_str(&format!(r#" s="{s}""#));
            }
            let formula = cell.formula.as_deref().unwrap_or_default();

            match &cell.value {
                CellValue::String(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap_or(0);
                    xml.push_str(&format!(r#"<c {attrs} t="s"><v>{idx}</v></c>"#));
                }
                CellValue::Number(n) => {
                    xml.push_str(&format!(r#"<c {attrs}>{formula}<v>{n}</v></c>"#));
                }
                CellValue::Boolean(b) => {
                    let v = u8::from(*b);
                    xml.push_str(&format!(r#"<c {attrs} t="b"><v>{v}</v></c>"#));
                }
                CellValue::InlineString(s) => {
                    xml.push_str(&format!(
                        r#"<c {attrs} t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    ));
                }
                CellValue::Empty => {
                    xml.push_str(&format!(r#"<c {attrs}/>"#));
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for merge in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{merge}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str("</worksheet>");
    xml
}

/// 1-indexed row number of an A1 reference.
fn row_of(cell_ref: &str) -> u32 {
    cell_ref
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .unwrap()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
