use crate::controls::ControlError;
use crate::dataset::error::DatasetError;
use crate::export::error::ExportError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AirQualityError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Failed to compute the dashboard")]
    Polars(#[from] PolarsError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
