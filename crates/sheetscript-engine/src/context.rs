use serde_json::Value;
use sheetscript_core::{CellCoord, CellValue, Sheet};

use crate::parser::Expression;

/// Dataset bindings visible to the cell being rendered
#[derive(Debug, Clone)]
pub struct DataRef {
    /// Dataset currently visible to expressions
    pub active: Value,
    /// Original dataset for the whole worksheet render, reachable via
    /// absolute path navigation
    pub root: Value,
    /// Datasets pushed by `select`, popped by `cancelSelect`
    pub selection: Vec<Value>,
}

impl DataRef {
    pub fn new(data: Value) -> Self {
        DataRef {
            active: data.clone(),
            root: data,
            selection: Vec::new(),
        }
    }
}

/// Event phases recognized by the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    /// Runs when the cursor reaches the target cell, before parsing it
    BeforeRender,
}

/// What a matched event does
#[derive(Debug, Clone)]
pub enum EventAction {
    /// Swap the worksheet's active dataset
    SetActiveDataset(Value),
}

/// A deferred callback bound to a future absolute grid coordinate.
///
/// Coordinates are logical row/column indices: whenever rows are
/// inserted above a target, the interpreter shifts it down so the
/// event stays aligned with the physical row it was scheduled for.
#[derive(Debug, Clone)]
pub struct Event {
    pub target: CellCoord,
    pub phase: EventPhase,
    pub action: EventAction,
}

/// A structural action scheduled during a cell's evaluation and run
/// after that cell's value is finalized
#[derive(Debug, Clone)]
pub enum Deferred {
    /// Duplicate the `for` template block once per group after the
    /// first, then schedule dataset swaps at each block's anchor cell
    /// and a restore just past the last block
    ForBlocks {
        /// First template row (0-indexed)
        start: u32,
        /// Last template row (0-indexed, inclusive)
        end: u32,
        /// The cell that issued the command
        anchor: CellCoord,
        /// Group key value and record subset, in first-occurrence order
        groups: Vec<(String, Value)>,
        /// Dataset to restore once the loop's rows are passed
        original: Value,
    },
    /// Duplicate the anchor row once per record after the first and
    /// write each record's fields into the row's mapped columns
    FillRows {
        anchor: CellCoord,
        records: Vec<Value>,
    },
}

/// Transient state for one cell visit, passed explicitly to every
/// dispatched function
pub struct Context<'a> {
    /// The worksheet being rendered
    pub sheet: &'a mut Sheet,
    /// Dataset bindings
    pub data: &'a mut DataRef,
    /// The expression currently executing
    pub expression: Option<&'a Expression>,
    /// Absolute grid position of the cell being rendered
    pub coord: CellCoord,
    /// Output accumulated by the executing expression
    pub output: CellValue,
    /// Actions to run after this cell's value is finalized
    pub deferred: Vec<Deferred>,
    /// Skip all remaining expressions in this cell
    pub halt: bool,
    /// Visit the current cell once more before advancing, so events
    /// just scheduled at this coordinate can fire
    pub revisit: bool,
    /// True during the post-process pass
    pub post_process: bool,
}

impl<'a> Context<'a> {
    /// The executing expression's column key ("" when absent)
    pub fn column_key(&self) -> String {
        self.expression
            .map(|e| e.column_key.clone())
            .unwrap_or_default()
    }
}
