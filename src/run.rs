//! End-to-end pipelines: load rows from a source, resolve, write results.
//!
//! Resolution runs on a copy of the loaded rows and output is produced only
//! after it succeeds, so a failed run never yields a partially updated layout.

use std::path::Path;

use tracing::debug;

use crate::cell_ref::CellRange;
use crate::config::RunConfig;
use crate::csv::{parse_delimited, write_placements, Delimiter};
use crate::error::{OverlapFixError, Result};
use crate::export::save_sheet;
use crate::json::{LayoutDocument, ResolvedDocument};
use crate::parser;
use crate::resolver::{find_overlaps, out_of_bounds, resolve, ResolveReport, ResolverConfig};
use crate::table::{load_workstations, StationRows};
use crate::types::{Placement, Workbook, Workstation};

/// Supported layout sources, chosen by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Xlsx,
    Csv,
    Tsv,
    Json,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            _ => Err(OverlapFixError::config(format!(
                "unsupported input '{}': expected .xlsx, .csv, .tsv or .json",
                path.display()
            ))),
        }
    }
}

/// What a successful run did.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub report: ResolveReport,
    pub placements: Vec<Placement>,
}

/// Result of a successful run: the serialized output plus a summary.
#[derive(Clone, Debug)]
pub struct Resolved {
    pub output: Vec<u8>,
    pub summary: RunSummary,
}

/// Findings of a read-only layout check.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutCheck {
    pub stations: Vec<Workstation>,
    pub overlaps: Vec<(usize, usize)>,
    pub out_of_bounds: Vec<usize>,
}

impl LayoutCheck {
    fn new(stations: Vec<Workstation>, config: &ResolverConfig) -> Self {
        Self {
            overlaps: find_overlaps(&stations),
            out_of_bounds: out_of_bounds(&stations, &config.floor),
            stations,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.overlaps.is_empty() && self.out_of_bounds.is_empty()
    }
}

/// Resolve a layout of any supported format.
pub fn resolve_input(format: InputFormat, data: &[u8], config: &RunConfig) -> Result<Resolved> {
    match format {
        InputFormat::Xlsx => resolve_workbook(data, config),
        InputFormat::Csv => resolve_delimited(data, Delimiter::Comma, config),
        InputFormat::Tsv => resolve_delimited(data, Delimiter::Tab, config),
        InputFormat::Json => resolve_json(data, config),
    }
}

/// Inspect a layout without moving anything.
pub fn check_input(format: InputFormat, data: &[u8], config: &RunConfig) -> Result<LayoutCheck> {
    let (stations, resolver) = match format {
        InputFormat::Xlsx => {
            let (input, _) = config.ranges()?;
            let workbook = parser::parse(data)?;
            let (_, loaded) = load_from_workbook(&workbook, &config.sheet, &input)?;
            (loaded.stations, config.resolver())
        }
        InputFormat::Csv => (delimited_stations(data, Delimiter::Comma)?, config.resolver()),
        InputFormat::Tsv => (delimited_stations(data, Delimiter::Tab)?, config.resolver()),
        InputFormat::Json => {
            let doc = LayoutDocument::from_slice(data)?;
            let resolver = doc.resolver_config(config.resolver());
            (doc.workstations, resolver)
        }
    };
    Ok(LayoutCheck::new(stations, &resolver))
}

/// Resolve the configured sheet range of an XLSX file and write the centers
/// into the output range. Returns the patched workbook.
pub fn resolve_workbook(data: &[u8], config: &RunConfig) -> Result<Resolved> {
    let (input, output) = config.ranges()?;
    let mut workbook = parser::parse(data)?;
    let (sheet_idx, loaded) = load_from_workbook(&workbook, &config.sheet, &input)?;

    let (stations, report) = resolve_copy(&loaded.stations, &config.resolver())?;

    let sheet = workbook
        .sheets
        .get_mut(sheet_idx)
        .ok_or_else(|| OverlapFixError::Parse(format!("sheet index {sheet_idx} vanished")))?;
    for (offset, ws) in loaded.offsets.iter().zip(&stations) {
        let row = u32::try_from(*offset)
            .ok()
            .and_then(|o| output.start_row.checked_add(o))
            .ok_or_else(|| OverlapFixError::config("output range row overflow"))?;
        sheet.set_number(row, output.start_col, ws.x);
        sheet.set_number(row, output.start_col + 1, ws.y);
    }

    let bytes = save_sheet(data, &workbook, sheet_idx)?;
    debug!(bytes = bytes.len(), range = %output, "wrote resolved workbook");

    Ok(Resolved {
        output: bytes,
        summary: summarize(&stations, report),
    })
}

/// Resolve CSV/TSV rows; the output is a `name,x,y` table in the same format.
pub fn resolve_delimited(data: &[u8], delim: Delimiter, config: &RunConfig) -> Result<Resolved> {
    let loaded = delimited_stations(data, delim)?;
    let (stations, report) = resolve_copy(&loaded, &config.resolver())?;
    let summary = summarize(&stations, report);
    Ok(Resolved {
        output: write_placements(&summary.placements, delim).into_bytes(),
        summary,
    })
}

/// Resolve a JSON layout document; the output is a JSON result document.
pub fn resolve_json(data: &[u8], config: &RunConfig) -> Result<Resolved> {
    let doc = LayoutDocument::from_slice(data)?;
    let resolver = doc.resolver_config(config.resolver());
    let (stations, report) = resolve_copy(&doc.workstations, &resolver)?;
    let json = ResolvedDocument::new(&stations, report).to_json_pretty()?;
    Ok(Resolved {
        output: json.into_bytes(),
        summary: summarize(&stations, report),
    })
}

fn load_from_workbook(
    workbook: &Workbook,
    sheet_name: &str,
    input: &CellRange,
) -> Result<(usize, StationRows)> {
    let sheet_idx = workbook
        .sheet_index(sheet_name)
        .ok_or_else(|| OverlapFixError::config(format!("Sheet named '{sheet_name}' not found.")))?;
    let sheet = workbook
        .sheets
        .get(sheet_idx)
        .ok_or_else(|| OverlapFixError::Parse(format!("sheet index {sheet_idx} out of range")))?;

    let loaded = load_workstations(&sheet.table(input))?;
    debug!(
        sheet = sheet_name,
        range = %input,
        stations = loaded.stations.len(),
        "loaded workstations"
    );
    Ok((sheet_idx, loaded))
}

fn delimited_stations(data: &[u8], delim: Delimiter) -> Result<Vec<Workstation>> {
    let loaded = load_workstations(&parse_delimited(data, delim))?;
    debug!(stations = loaded.stations.len(), "loaded workstations");
    Ok(loaded.stations)
}

fn resolve_copy(
    stations: &[Workstation],
    config: &ResolverConfig,
) -> Result<(Vec<Workstation>, ResolveReport)> {
    let mut working = stations.to_vec();
    let report = resolve(&mut working, config)?;
    Ok((working, report))
}

fn summarize(stations: &[Workstation], report: ResolveReport) -> RunSummary {
    RunSummary {
        report,
        placements: stations.iter().map(Workstation::placement).collect(),
    }
}
