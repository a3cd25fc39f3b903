//! Reading schedule inputs and writing results. Nothing here is consulted by
//! the model builder; callers load an input, then hand it to [`crate::run`].
pub mod json;
pub mod xlsx;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("file error: {0}")]
    File(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("spreadsheet read failed: {0}")]
    SheetRead(String),

    #[error("spreadsheet write failed: {0}")]
    SheetWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("sheet {sheet} row {row}: {message}")]
    BadRow {
        sheet: &'static str,
        row: u32,
        message: String,
    },

    #[error("missing sheet {0}")]
    MissingSheet(&'static str),
}
