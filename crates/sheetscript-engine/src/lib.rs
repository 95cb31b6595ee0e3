//! Template rendering engine for sheetscript workbooks.
//!
//! Cells may carry `{...}` command blocks in a small DSL: a column
//! key, an optional execution marker (`$` primary pass, `@`
//! post-process pass), and a chain of function calls. The renderer
//! walks each worksheet in row-major order over two passes, executing
//! expressions against a JSON data source and applying structural
//! changes (row duplication, sheet instantiation, merged regions) as
//! it goes.

pub mod context;
pub mod data;
pub mod error;
pub mod functions;
pub mod parser;
pub mod render;
pub mod token;

pub use context::{Context, DataRef, Deferred, Event, EventAction, EventPhase};
pub use error::{ParseError, RenderError};
pub use parser::{
    coerce_argument, has_command, parse_cell, Argument, Expression, FunctionCall, ParsedCell,
};
pub use render::{render_workbook, SheetRenderer};
pub use token::{Lexer, Marker, Token};

use serde_json::Value;
use sheetscript_core::Workbook;

/// Render a workbook template in place against a JSON data source
pub fn render(workbook: &mut Workbook, dataset: &Value) -> Result<(), RenderError> {
    render::render_workbook(workbook, dataset)
}
