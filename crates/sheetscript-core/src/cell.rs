use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Visual styling carried by a cell.
///
/// Only the attributes row duplication and sheet copies must preserve;
/// full styling fidelity belongs to the physical file codec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    /// Border style name (e.g. "thin"), applied to all four edges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    /// Fill color as an ARGB hex string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    /// Number format code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
}

impl CellStyle {
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }
}

/// One grid location: a resolved value plus styling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "CellStyle::is_default")]
    pub style: CellStyle,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Cell {
            value,
            style: CellStyle::default(),
        }
    }

    /// Create a cell with a text value
    pub fn text(value: impl Into<String>) -> Self {
        Cell::new(CellValue::Text(value.into()))
    }

    /// Create a cell with a number value
    pub fn number(value: f64) -> Self {
        Cell::new(CellValue::Number(value))
    }

    /// The cell's display text ("" for an empty cell)
    pub fn display_text(&self) -> String {
        self.value.as_text()
    }

    /// Check if the cell holds no value and no styling
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style.is_default()
    }
}
