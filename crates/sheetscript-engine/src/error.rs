use sheetscript_core::DocumentError;
use thiserror::Error;

/// Errors raised while tokenizing or parsing cell text
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unterminated command block in cell text {0:?}")]
    UnterminatedCommand(String),

    #[error("unexpected text {text:?} in cell {cell_text:?}")]
    UnexpectedText { text: String, cell_text: String },
}

/// Errors raised during template rendering
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("cancelSelect called without a matching select")]
    SelectStackEmpty,

    #[error("{function} called on an empty dataset")]
    EmptyDataset { function: &'static str },
}
