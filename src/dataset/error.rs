use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cached dataset '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cached dataset '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to delete cached dataset '{0}'")]
    CacheDeletion(PathBuf, #[source] std::io::Error),

    #[error("Failed to read dataset file '{0}'")]
    FileRead(PathBuf, #[source] std::io::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Parsing error processing CSV data from '{origin}'")]
    CsvRead {
        origin: String,
        #[source]
        source: PolarsError,
    },

    #[error("Missing required column '{column}' in data from '{origin}'")]
    MissingColumn { origin: String, column: String },

    #[error("No complete observations left in data from '{origin}' after removing missing values")]
    EmptyDataset { origin: String },

    #[error("Failed to clean data from '{origin}': {source}")]
    Cleaning {
        origin: String,
        #[source]
        source: PolarsError,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
