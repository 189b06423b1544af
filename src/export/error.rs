use polars::error::PolarsError;
use rust_xlsxwriter::XlsxError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialise the filtered data")]
    Polars(#[from] PolarsError),

    #[error("Failed to build the Excel workbook")]
    Xlsx(#[from] XlsxError),

    #[error("Failed to write export file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),
}
