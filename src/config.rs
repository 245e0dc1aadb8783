//! Run configuration: where the rows live, where results go, and the floor.
//!
//! Every field has a default, so a config file only needs the keys it changes:
//!
//! ```json
//! { "sheet": "Level 2", "floor": { "width": 4200.0, "height": 1800.0 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::cell_ref::CellRange;
use crate::error::{OverlapFixError, Result};
use crate::resolver::{ResolverConfig, DEFAULT_MAX_ITERATIONS};
use crate::types::Floor;

pub const DEFAULT_SHEET: &str = "overlap fix";
pub const DEFAULT_INPUT_RANGE: &str = "A2:E10";
pub const DEFAULT_OUTPUT_RANGE: &str = "J2:K10";

/// Columns of a workstation row: name, x, y, length, width.
pub const INPUT_COLUMNS: usize = 5;
/// Columns of a result row: x, y.
pub const OUTPUT_COLUMNS: usize = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Worksheet holding both tables (XLSX only).
    pub sheet: String,
    /// Workstation rows, five columns wide.
    pub input_range: String,
    /// Destination for the resolved centers, two columns wide.
    pub output_range: String,
    pub floor: Floor,
    pub max_iterations: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sheet: DEFAULT_SHEET.to_string(),
            input_range: DEFAULT_INPUT_RANGE.to_string(),
            output_range: DEFAULT_OUTPUT_RANGE.to_string(),
            floor: Floor::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn resolver(&self) -> ResolverConfig {
        ResolverConfig::new(self.floor).with_max_iterations(self.max_iterations)
    }

    /// Parse both ranges and check their shapes against each other.
    pub fn ranges(&self) -> Result<(CellRange, CellRange)> {
        let input = CellRange::parse(&self.input_range)?;
        let output = CellRange::parse(&self.output_range)?;

        if input.cols() != INPUT_COLUMNS {
            return Err(OverlapFixError::config(format!(
                "input range {input} must be {INPUT_COLUMNS} columns wide (name, x, y, length, width)"
            )));
        }
        if output.cols() != OUTPUT_COLUMNS {
            return Err(OverlapFixError::config(format!(
                "output range {output} must be {OUTPUT_COLUMNS} columns wide (x, y)"
            )));
        }
        if output.rows() != input.rows() {
            return Err(OverlapFixError::config(format!(
                "output range {output} has {} rows but input range {input} has {}",
                output.rows(),
                input.rows()
            )));
        }
        Ok((input, output))
    }
}
