//! Data types for layouts and the workbooks they are stored in.

mod cell;
mod geometry;
mod workbook;

pub use cell::*;
pub use geometry::*;
pub use workbook::*;
