pub mod cell;
pub mod error;
pub mod range;
pub mod sheet;
pub mod value;
pub mod workbook;

pub use cell::{Cell, CellStyle};
pub use error::DocumentError;
pub use range::{col_to_label, CellCoord, CellRange};
pub use sheet::{Row, Sheet};
pub use value::{parse_value_text, CellValue};
pub use workbook::Workbook;
