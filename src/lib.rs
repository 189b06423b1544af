pub mod aggregation;
mod controls;
mod dashboard;
mod dataset;
mod error;
mod export;
mod filtering;
mod presentation;
mod types;
mod utils;

pub use dashboard::*;
pub use error::AirQualityError;

pub use controls::*;
pub use filtering::*;

pub use dataset::error::DatasetError;
pub use dataset::{DataSource, Dataset, DatasetBounds};

pub use export::error::ExportError;
pub use export::*;

pub use presentation::interpretation;
pub use presentation::*;

pub use types::chart::*;
pub use types::station::*;
pub use types::variable::*;
