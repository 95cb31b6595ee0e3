use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::DocumentError;
use crate::range::{CellCoord, CellRange};
use crate::value::CellValue;

/// One grid row: cells in column order plus an optional custom height
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Row {
    fn ensure_col(&mut self, col: u32) -> &mut Cell {
        let col = col as usize;
        if self.cells.len() <= col {
            self.cells.resize(col + 1, Cell::default());
        }
        &mut self.cells[col]
    }
}

/// A single worksheet with dense row storage.
///
/// Rows are stored densely because template rendering walks the grid
/// in row-major order and inserts rows mid-walk; logical row indices
/// must stay aligned with physical positions while the grid grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name (displayed in tab)
    pub name: String,
    #[serde(default)]
    rows: Vec<Row>,
    /// Merged rectangular regions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    merges: Vec<CellRange>,
}

impl Sheet {
    /// Create a new empty sheet with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Sheet {
            name: name.into(),
            rows: Vec::new(),
            merges: Vec::new(),
        }
    }

    /// Number of rows in the grid
    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Number of cells stored in a row (0 for rows past the grid)
    pub fn row_len(&self, row: u32) -> u32 {
        self.rows
            .get(row as usize)
            .map(|r| r.cells.len() as u32)
            .unwrap_or(0)
    }

    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(row as usize)
    }

    fn ensure_row(&mut self, row: u32) -> &mut Row {
        let row = row as usize;
        if self.rows.len() <= row {
            self.rows.resize(row + 1, Row::default());
        }
        &mut self.rows[row]
    }

    /// Get a reference to a cell at the given coordinate
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.rows
            .get(coord.row as usize)
            .and_then(|r| r.cells.get(coord.col as usize))
    }

    /// Get a mutable reference to a cell, growing the grid if needed
    pub fn cell_mut(&mut self, coord: CellCoord) -> &mut Cell {
        self.ensure_row(coord.row).ensure_col(coord.col)
    }

    /// The display text of a cell ("" for missing cells)
    pub fn cell_text(&self, coord: CellCoord) -> String {
        self.cell(coord).map(|c| c.display_text()).unwrap_or_default()
    }

    /// The value of a cell (Empty for missing cells)
    pub fn cell_value(&self, coord: CellCoord) -> CellValue {
        self.cell(coord).map(|c| c.value.clone()).unwrap_or_default()
    }

    /// Set a cell's value, keeping its existing style
    pub fn set_cell_value(&mut self, coord: CellCoord, value: CellValue) {
        self.cell_mut(coord).value = value;
    }

    /// Set a cell's value to the given text, keeping its existing style
    pub fn set_cell_text(&mut self, coord: CellCoord, text: impl Into<String>) {
        self.cell_mut(coord).value = CellValue::Text(text.into());
    }

    /// Replace a whole cell (value and style)
    pub fn set_cell(&mut self, coord: CellCoord, cell: Cell) {
        *self.cell_mut(coord) = cell;
    }

    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.rows.get(row as usize).and_then(|r| r.height)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.ensure_row(row).height = Some(height);
    }

    /// Duplicate the template rows `[template_start, template_end]` and
    /// insert the copies before row `at`, carrying values, styles and
    /// row heights. Returns the number of rows inserted.
    ///
    /// `at` must lie strictly below the template block: inserting at or
    /// above rows that may already have been rendered is a template
    /// programming error, not a recoverable condition.
    pub fn insert_copied_rows(
        &mut self,
        template_start: u32,
        template_end: u32,
        at: u32,
    ) -> Result<u32, DocumentError> {
        if at <= template_end {
            return Err(DocumentError::RowInsertOutOfOrder { at, template_end });
        }
        let count = template_end - template_start + 1;

        // Make the template block and the insertion point physically
        // present so indices line up even on sparse tails.
        self.ensure_row(template_end);
        if (at as usize) > self.rows.len() {
            self.rows.resize(at as usize, Row::default());
        }

        let copies: Vec<Row> = (template_start..=template_end)
            .map(|r| self.rows[r as usize].clone())
            .collect();
        // Template indices are unaffected: at > template_end.
        self.rows.splice(at as usize..at as usize, copies);
        Ok(count)
    }

    /// Currently merged regions
    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    /// Merge a rectangular region. Re-merging an identical region is a
    /// no-op.
    pub fn merge_range(&mut self, range: CellRange) {
        if !self.merges.contains(&range) {
            self.merges.push(range);
        }
    }

    /// Remove the merged region anchored at the given top-left cell,
    /// returning it if one existed
    pub fn unmerge_at(&mut self, top_left: CellCoord) -> Option<CellRange> {
        let idx = self.merges.iter().position(|m| m.top_left() == top_left)?;
        Some(self.merges.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellStyle;

    #[test]
    fn test_sheet_basic_operations() {
        let mut sheet = Sheet::new("Test");
        let coord = CellCoord::new(0, 0);
        sheet.set_cell(coord, Cell::number(42.0));

        assert_eq!(sheet.cell(coord).unwrap().value.as_number(), Some(42.0));
        assert_eq!(sheet.cell_text(coord), "42");
        assert_eq!(sheet.row_count(), 1);

        // Reads past the grid do not grow it
        assert_eq!(sheet.cell_value(CellCoord::new(9, 9)), CellValue::Empty);
        assert_eq!(sheet.row_count(), 1);
    }

    #[test]
    fn test_insert_copied_rows() {
        let mut sheet = Sheet::new("Test");
        sheet.set_cell_text(CellCoord::new(0, 0), "header");
        let mut styled = Cell::text("body");
        styled.style = CellStyle {
            border: Some("thin".to_string()),
            ..CellStyle::default()
        };
        sheet.set_cell(CellCoord::new(1, 0), styled);
        sheet.set_row_height(1, 30.0);
        sheet.set_cell_text(CellCoord::new(2, 0), "footer");

        let count = sheet.insert_copied_rows(1, 1, 2).unwrap();
        assert_eq!(count, 1);
        assert_eq!(sheet.row_count(), 4);
        assert_eq!(sheet.cell_text(CellCoord::new(2, 0)), "body");
        assert_eq!(
            sheet.cell(CellCoord::new(2, 0)).unwrap().style.border.as_deref(),
            Some("thin")
        );
        assert_eq!(sheet.row_height(2), Some(30.0));
        // Rows below the insertion shifted down
        assert_eq!(sheet.cell_text(CellCoord::new(3, 0)), "footer");
    }

    #[test]
    fn test_insert_before_template_is_an_error() {
        let mut sheet = Sheet::new("Test");
        sheet.set_cell_text(CellCoord::new(2, 0), "x");
        let err = sheet.insert_copied_rows(1, 2, 2).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::RowInsertOutOfOrder { at: 2, template_end: 2 }
        ));
    }

    #[test]
    fn test_merge_and_unmerge() {
        let mut sheet = Sheet::new("Test");
        let range = CellRange::new(CellCoord::new(0, 0), CellCoord::new(2, 1));
        sheet.merge_range(range);
        sheet.merge_range(range);
        assert_eq!(sheet.merges().len(), 1);

        let removed = sheet.unmerge_at(CellCoord::new(0, 0)).unwrap();
        assert_eq!(removed, range);
        assert!(sheet.merges().is_empty());
        assert!(sheet.unmerge_at(CellCoord::new(0, 0)).is_none());
    }
}
