//! JSON layout documents.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::resolver::{ResolveReport, ResolverConfig};
use crate::types::{Floor, Placement, Workstation};

/// Input document. `floor` and `max_iterations` override the run config when
/// present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<Floor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    pub workstations: Vec<Workstation>,
}

impl LayoutDocument {
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Apply this document's overrides on top of `base`.
    pub fn resolver_config(&self, base: ResolverConfig) -> ResolverConfig {
        ResolverConfig {
            floor: self.floor.unwrap_or(base.floor),
            max_iterations: self.max_iterations.unwrap_or(base.max_iterations),
        }
    }
}

/// Output document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDocument {
    pub placements: Vec<Placement>,
    pub passes: usize,
    pub corrections: usize,
}

impl ResolvedDocument {
    pub fn new(stations: &[Workstation], report: ResolveReport) -> Self {
        Self {
            placements: stations.iter().map(Workstation::placement).collect(),
            passes: report.passes,
            corrections: report.corrections,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
