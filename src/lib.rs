//! overlap_fix - separate overlapping workstation rectangles on a floor plan
//!
//! Reads a table of workstations (name, center, length along x, width along y)
//! from an XLSX sheet, CSV/TSV or JSON, pushes each overlapping pair apart by
//! half its penetration on both axes and keeps every rectangle inside the
//! floor.
//!
//! # Usage
//!
//! ```
//! use overlap_fix::{resolve, Floor, ResolverConfig, Workstation};
//!
//! let mut stations = vec![
//!     Workstation::new("a", 50.0, 50.0, 10.0, 10.0),
//!     Workstation::new("b", 50.0, 50.0, 10.0, 10.0),
//! ];
//! let config = ResolverConfig::new(Floor::new(100.0, 100.0));
//! let report = resolve(&mut stations, &config).unwrap();
//! assert_eq!(report.corrections, 1);
//! assert_eq!((stations[0].x, stations[1].x), (45.0, 55.0));
//! ```

// Geometry and resolution
pub mod error;
pub mod resolver;
pub mod types;

// Adapters
pub mod cell_ref;
pub mod config;
pub mod csv;
pub mod export;
pub mod json;
pub mod parser;
pub mod run;
pub mod table;
pub mod xml_helpers;

pub use config::RunConfig;
pub use error::{OverlapFixError, Result};
pub use resolver::{find_overlaps, out_of_bounds, resolve, ResolveReport, ResolverConfig};
pub use run::{check_input, resolve_input, InputFormat, LayoutCheck, Resolved, RunSummary};
pub use types::{Floor, Placement, Workstation};
