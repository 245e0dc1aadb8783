//! Structured error types for overlap_fix.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! distinguishes bad input (caught before any rectangle moves) from a resolver
//! that ran out of passes.

/// All errors that can occur while loading, resolving and writing a layout.
#[derive(Debug, thiserror::Error)]
pub enum OverlapFixError {
    /// Input is missing or malformed. Raised before any processing happens.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The iteration budget ran out while overlaps were still being corrected.
    #[error(
        "Unable to resolve all overlaps within the maximum iterations \
         ({iterations} passes, {last_pass_corrections} corrections in the last pass)"
    )]
    Convergence {
        iterations: usize,
        last_pass_corrections: usize,
    },

    /// Invalid cell reference or range.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// Structurally invalid workbook content.
    #[error("Parse error: {0}")]
    Parse(String),

    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OverlapFixError {
    /// Shorthand for [`OverlapFixError::Configuration`].
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// `true` for errors raised before the resolver ran.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::CellRef(_))
    }

    /// `true` when the resolver exhausted its pass budget.
    #[must_use]
    pub fn is_convergence(&self) -> bool {
        matches!(self, Self::Convergence { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OverlapFixError>;
