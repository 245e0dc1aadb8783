//! End-to-end tests for resolving layouts stored in an XLSX sheet
//!
//! Workbooks are built in memory; the resolved file is parsed back with the
//! crate's own reader and also inspected at the ZIP level.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;

use fixtures::{part_names, read_part, SheetBuilder, XlsxBuilder};
use overlap_fix::parser::parse;
use overlap_fix::run::{check_input, resolve_workbook, InputFormat};
use overlap_fix::types::{CellValue, Floor};
use overlap_fix::RunConfig;

fn small_floor() -> RunConfig {
    RunConfig {
        floor: Floor::new(100.0, 100.0),
        ..RunConfig::default()
    }
}

fn layout_sheet() -> SheetBuilder {
    SheetBuilder::new("overlap fix")
        .header()
        .station(2, "WS-1", 50.0, 50.0, 10.0, 10.0)
        .station(3, "WS-2", 50.0, 50.0, 10.0, 10.0)
        .station(4, "WS-3", 80.0, 20.0, 10.0, 10.0)
}

// ============================================================================
// WRITE-BACK
// ============================================================================

#[test]
fn test_resolved_centers_land_in_output_range() {
    let xlsx = XlsxBuilder::new().sheet(layout_sheet()).build();

    let resolved = resolve_workbook(&xlsx, &small_floor()).unwrap();
    assert_eq!(resolved.summary.report.corrections, 1);

    let wb = parse(&resolved.output).unwrap();
    let sheet = wb.sheet("overlap fix").unwrap();
    // J2:K4 (0-indexed rows 1..=3, cols 9..=10)
    assert_eq!(sheet.value_at(1, 9), CellValue::Number(45.0));
    assert_eq!(sheet.value_at(1, 10), CellValue::Number(45.0));
    assert_eq!(sheet.value_at(2, 9), CellValue::Number(55.0));
    assert_eq!(sheet.value_at(2, 10), CellValue::Number(55.0));
    assert_eq!(sheet.value_at(3, 9), CellValue::Number(80.0));
    assert_eq!(sheet.value_at(3, 10), CellValue::Number(20.0));
    // Nothing beyond the last workstation row
    assert_eq!(sheet.value_at(4, 9), CellValue::Empty);
}

#[test]
fn test_input_cells_and_headers_survive() {
    let xlsx = XlsxBuilder::new().sheet(layout_sheet()).build();
    let resolved = resolve_workbook(&xlsx, &small_floor()).unwrap();

    let wb = parse(&resolved.output).unwrap();
    let sheet = wb.sheet("overlap fix").unwrap();
    assert_eq!(sheet.value_at(0, 0), CellValue::Text("Name".into()));
    assert_eq!(sheet.value_at(0, 9), CellValue::Text("New X".into()));
    assert_eq!(sheet.value_at(1, 0), CellValue::Text("WS-1".into()));
    // Source coordinates are not modified
    assert_eq!(sheet.value_at(2, 1), CellValue::Number(50.0));
}

#[test]
fn test_blank_row_keeps_its_output_row_empty() {
    let sheet = SheetBuilder::new("overlap fix")
        .station(2, "WS-1", 50.0, 50.0, 10.0, 10.0)
        .station(4, "WS-2", 50.0, 50.0, 10.0, 10.0);
    let xlsx = XlsxBuilder::new().sheet(sheet).build();

    let resolved = resolve_workbook(&xlsx, &small_floor()).unwrap();
    let wb = parse(&resolved.output).unwrap();
    let sheet = wb.sheet("overlap fix").unwrap();

    assert_eq!(sheet.value_at(1, 9), CellValue::Number(45.0));
    assert_eq!(sheet.value_at(2, 9), CellValue::Empty);
    assert_eq!(sheet.value_at(3, 9), CellValue::Number(55.0));
}

#[test]
fn test_output_cell_keeps_style_and_loses_formula() {
    let sheet = layout_sheet()
        .styled_cell("J2", 1)
        .formula("K2", "C2", 50.0);
    let xlsx = XlsxBuilder::new().sheet(sheet).build();

    let resolved = resolve_workbook(&xlsx, &small_floor()).unwrap();
    let wb = parse(&resolved.output).unwrap();
    let sheet = wb.sheet("overlap fix").unwrap();

    let j2 = sheet.cell(1, 9).unwrap();
    assert_eq!(j2.style_idx, Some(1));
    assert_eq!(j2.value, CellValue::Number(45.0));
    let k2 = sheet.cell(1, 10).unwrap();
    assert_eq!(k2.formula, None);
    assert_eq!(k2.value, CellValue::Number(45.0));
}

#[test]
fn test_shared_formulas_outside_output_survive() {
    let sheet = layout_sheet()
        .shared_formula("M2", 0, Some(("M2:M3", "B2*2")), 100.0)
        .shared_formula("M3", 0, None, 100.0);
    let xlsx = XlsxBuilder::new().sheet(sheet).build();

    let resolved = resolve_workbook(&xlsx, &small_floor()).unwrap();

    let xml = read_part(&resolved.output, "xl/worksheets/sheet1.xml");
    assert!(
        xml.contains(r#"<c r="M2"><f t="shared" ref="M2:M3" si="0">B2*2</f><v>100</v></c>"#),
        "{xml}"
    );
    assert!(xml.contains(r#"<c r="M3"><f t="shared" si="0"/><v>100</v></c>"#), "{xml}");

    let wb = parse(&resolved.output).unwrap();
    let sheet = wb.sheet("overlap fix").unwrap();
    let follower = sheet.cell(2, 12).unwrap().formula.clone().unwrap();
    assert_eq!(follower.kind.as_deref(), Some("shared"));
    assert_eq!(follower.shared_index, Some(0));
    assert!(follower.text.is_empty());
    let master = sheet.cell(1, 12).unwrap().formula.clone().unwrap();
    assert_eq!(master.text, "B2*2");
    assert_eq!(master.range.as_deref(), Some("M2:M3"));
}

#[test]
fn test_other_sheets_and_parts_are_copied_verbatim() {
    let xlsx = XlsxBuilder::new()
        .sheet(SheetBuilder::new("Notes").cell("A1", "keep me").merge("A1:C1"))
        .sheet(layout_sheet())
        .part("docProps/app.xml", "<Properties><Application>test</Application></Properties>")
        .build();

    let resolved = resolve_workbook(&xlsx, &small_floor()).unwrap();

    assert_eq!(part_names(&resolved.output), part_names(&xlsx));
    for part in [
        "xl/worksheets/sheet1.xml",
        "xl/sharedStrings.xml",
        "xl/styles.xml",
        "xl/workbook.xml",
        "docProps/app.xml",
    ] {
        assert_eq!(read_part(&resolved.output, part), read_part(&xlsx, part), "{part}");
    }
    assert_ne!(
        read_part(&resolved.output, "xl/worksheets/sheet2.xml"),
        read_part(&xlsx, "xl/worksheets/sheet2.xml")
    );
}

#[test]
fn test_custom_ranges() {
    let sheet = SheetBuilder::new("Level 2")
        .cell("C5", "desk")
        .cell("D5", 50.0)
        .cell("E5", 50.0)
        .cell("F5", 10.0)
        .cell("G5", 10.0)
        .cell("C6", "desk 2")
        .cell("D6", 50.0)
        .cell("E6", 50.0)
        .cell("F6", 10.0)
        .cell("G6", 10.0);
    let xlsx = XlsxBuilder::new().sheet(sheet).build();
    let config = RunConfig {
        sheet: "Level 2".into(),
        input_range: "C5:G6".into(),
        output_range: "A5:B6".into(),
        ..small_floor()
    };

    let resolved = resolve_workbook(&xlsx, &config).unwrap();
    let wb = parse(&resolved.output).unwrap();
    let sheet = wb.sheet("Level 2").unwrap();
    assert_eq!(sheet.value_at(4, 0), CellValue::Number(45.0));
    assert_eq!(sheet.value_at(5, 1), CellValue::Number(55.0));
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_missing_sheet() {
    let xlsx = XlsxBuilder::new()
        .sheet(SheetBuilder::new("Overlap Fix"))
        .build();

    let err = resolve_workbook(&xlsx, &RunConfig::default()).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(
        err.to_string(),
        "Configuration error: Sheet named 'overlap fix' not found."
    );
}

#[test]
fn test_non_numeric_cell_names_row_and_column() {
    let sheet = SheetBuilder::new("overlap fix")
        .station(2, "WS-1", 50.0, 50.0, 10.0, 10.0)
        .cell("A3", "WS-2")
        .cell("B3", 50.0)
        .cell("C3", 50.0)
        .cell("D3", "wide")
        .cell("E3", 10.0);
    let xlsx = XlsxBuilder::new().sheet(sheet).build();

    let err = resolve_workbook(&xlsx, &small_floor()).unwrap_err();
    assert!(err.is_configuration());
    let msg = err.to_string();
    assert!(msg.contains("row 2"), "{msg}");
    assert!(msg.contains("'length'"), "{msg}");
}

#[test]
fn test_oversize_rectangle_is_configuration_error() {
    let sheet = SheetBuilder::new("overlap fix").station(2, "hall", 50.0, 50.0, 200.0, 10.0);
    let xlsx = XlsxBuilder::new().sheet(sheet).build();

    let err = resolve_workbook(&xlsx, &small_floor()).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_non_convergence_produces_no_output() {
    let xlsx = XlsxBuilder::new().sheet(layout_sheet()).build();
    let config = RunConfig {
        max_iterations: 1,
        ..small_floor()
    };

    let err = resolve_workbook(&xlsx, &config).unwrap_err();
    assert!(err.is_convergence());
}

#[test]
fn test_mismatched_ranges_rejected() {
    let xlsx = XlsxBuilder::new().sheet(layout_sheet()).build();
    let config = RunConfig {
        output_range: "J2:K5".into(),
        ..small_floor()
    };
    assert!(resolve_workbook(&xlsx, &config)
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_not_a_workbook() {
    assert!(resolve_workbook(b"name,x,y", &RunConfig::default()).is_err());
}

// ============================================================================
// CHECK MODE
// ============================================================================

#[test]
fn test_check_reports_overlaps_in_sheet() {
    let xlsx = XlsxBuilder::new().sheet(layout_sheet()).build();
    let check = check_input(InputFormat::Xlsx, &xlsx, &small_floor()).unwrap();

    assert_eq!(check.stations.len(), 3);
    assert_eq!(check.overlaps, vec![(0, 1)]);
    assert!(check.out_of_bounds.is_empty());
    assert!(!check.is_clean());
}
