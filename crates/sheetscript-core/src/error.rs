use thiserror::Error;

/// Errors raised by the in-memory document model
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("row insert at {at} must land below template rows ending at {template_end}")]
    RowInsertOutOfOrder { at: u32, template_end: u32 },

    #[error("worksheet {0:?} already exists")]
    SheetNameExists(String),

    #[error("worksheet index {0} out of bounds")]
    SheetIndexOutOfBounds(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
