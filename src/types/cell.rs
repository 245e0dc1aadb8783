use serde::Serialize;

/// Cell with position
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellData {
    pub r: u32, // row (0-indexed)
    pub c: u32, // col (0-indexed)
    pub cell: Cell,
}

/// A single cell's value and the bits needed to write it back unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Cell {
    pub value: CellValue,
    /// Index into the workbook's cellXfs; kept verbatim on save.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_idx: Option<u32>,
    /// The cell's `<f>` element. The cached result lives in `value`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<Formula>,
}

/// A cell formula with the attributes that tie it to a shared or array group.
///
/// Followers of a shared group carry no text, only `kind` and `shared_index`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Formula {
    pub text: String,
    /// The `t` attribute (`shared`, `array`, `dataTable`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// The `ref` attribute: the range a shared master or array formula covers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// The `si` attribute: the shared group index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_index: Option<u32>,
}

impl Formula {
    /// A plain formula with no group attributes.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// True when there is neither text nor any attribute worth writing back.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.kind.is_none()
            && self.range.is_none()
            && self.shared_index.is_none()
    }
}

/// A single cell as read from a tabular source.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric value of a number cell, or of a text cell that parses as one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Empty => "empty".to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => format!("'{s}'"),
            Self::Bool(b) => b.to_string(),
            Self::Error(e) => e.clone(),
        }
    }
}
