use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::DocumentError;
use crate::sheet::Sheet;

/// A workbook containing ordered sheets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    /// Workbook name (usually the file name)
    pub name: String,
    /// Sheets in display order
    pub sheets: Vec<Sheet>,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Workbook {
    /// Create a new workbook with no sheets
    pub fn new(name: impl Into<String>) -> Self {
        Workbook {
            name: name.into(),
            sheets: Vec::new(),
        }
    }

    /// Get a sheet by index
    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Get a mutable sheet by index
    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    /// Get a sheet by name
    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Get the index of a sheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    /// Sheet names in display order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Append a new empty sheet with the given name
    pub fn add_sheet(&mut self, name: impl Into<String>) -> Result<usize, DocumentError> {
        let index = self.sheets.len();
        self.insert_sheet(index, name)
    }

    /// Insert a new empty sheet at the given position
    pub fn insert_sheet(
        &mut self,
        index: usize,
        name: impl Into<String>,
    ) -> Result<usize, DocumentError> {
        let name = name.into();
        if self.sheets.iter().any(|s| s.name == name) {
            return Err(DocumentError::SheetNameExists(name));
        }
        if index > self.sheets.len() {
            return Err(DocumentError::SheetIndexOutOfBounds(index));
        }
        self.sheets.insert(index, Sheet::new(name));
        Ok(index)
    }

    /// Remove the sheet at the given index
    pub fn remove_sheet(&mut self, index: usize) -> Result<Sheet, DocumentError> {
        if index >= self.sheets.len() {
            return Err(DocumentError::SheetIndexOutOfBounds(index));
        }
        Ok(self.sheets.remove(index))
    }

    /// Rename the sheet at the given index
    pub fn rename_sheet(
        &mut self,
        index: usize,
        name: impl Into<String>,
    ) -> Result<(), DocumentError> {
        let name = name.into();
        if self
            .sheets
            .iter()
            .enumerate()
            .any(|(i, s)| i != index && s.name == name)
        {
            return Err(DocumentError::SheetNameExists(name));
        }
        match self.sheets.get_mut(index) {
            Some(sheet) => {
                sheet.name = name;
                Ok(())
            }
            None => Err(DocumentError::SheetIndexOutOfBounds(index)),
        }
    }

    /// Move the sheet at `from` so it sits at position `to`
    pub fn move_sheet(&mut self, from: usize, to: usize) -> Result<(), DocumentError> {
        if from >= self.sheets.len() {
            return Err(DocumentError::SheetIndexOutOfBounds(from));
        }
        if to >= self.sheets.len() {
            return Err(DocumentError::SheetIndexOutOfBounds(to));
        }
        let sheet = self.sheets.remove(from);
        self.sheets.insert(to, sheet);
        Ok(())
    }

    /// Duplicate the sheet at `index` under a new name, placing the
    /// copy immediately after the original. The copy carries the full
    /// layout: cells, styles, row heights and merged regions. Returns
    /// the index of the new sheet.
    pub fn duplicate_sheet(
        &mut self,
        index: usize,
        new_name: impl Into<String>,
    ) -> Result<usize, DocumentError> {
        let new_name = new_name.into();
        if self.sheets.iter().any(|s| s.name == new_name) {
            return Err(DocumentError::SheetNameExists(new_name));
        }
        let template = self
            .sheets
            .get(index)
            .ok_or(DocumentError::SheetIndexOutOfBounds(index))?;
        let mut copy = template.clone();
        copy.name = new_name;
        self.sheets.insert(index + 1, copy);
        Ok(index + 1)
    }

    /// Serialize the workbook to a JSON byte buffer
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Load a workbook from a JSON byte buffer
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Load a workbook from a JSON file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let bytes = std::fs::read(path)?;
        Self::from_json_bytes(&bytes)
    }

    /// Save the workbook to a JSON file
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        std::fs::write(path, self.to_json_bytes()?)?;
        Ok(())
    }
}
