//! Loading and cleaning of the PRSA station files.
//!
//! A [`Dataset`] is produced once per session and is read-only afterwards; every
//! interaction derives a fresh [`crate::FilteredView`] from it.

pub mod error;
pub(crate) mod loader;

use crate::dataset::error::DatasetError;
use crate::dataset::loader::DatasetLoader;
use crate::types::variable::{DAY_COLUMN, MONTH_COLUMN, STATION_COLUMN, YEAR_COLUMN};
use crate::{Station, Variable};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where the raw CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// One of the published PRSA station files.
    Station(Station),
    /// Any URL serving a file with the PRSA layout.
    Url(String),
    /// A local copy of a file with the PRSA layout.
    File(PathBuf),
}

impl DataSource {
    pub(crate) fn cache_file_name(&self) -> String {
        match self {
            DataSource::Station(station) => station.file_name(),
            DataSource::Url(url) => url
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .map(|segment| {
                    segment
                        .chars()
                        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
                        .collect()
                })
                .unwrap_or_else(|| "dataset.csv".to_string()),
            DataSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "dataset.csv".to_string()),
        }
    }
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Station(Station::default())
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Station(station) => write!(f, "{}", station.url()),
            DataSource::Url(url) => write!(f, "{}", url),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The selectable extent of a dataset. Controls are clamped to these values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetBounds {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
}

/// A cleaned table of hourly observations for one station.
///
/// Every row is complete: rows with any missing value were dropped while loading.
/// The original columns keep their names and order and a `date` column is appended.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    origin: String,
    bounds: DatasetBounds,
    pm25_mean: f64,
}

impl Dataset {
    pub(crate) async fn load(
        loader: &DatasetLoader,
        source: &DataSource,
    ) -> Result<Self, DatasetError> {
        let frame = loader.get_frame(source).await?;
        Self::from_frame(frame, &source.to_string())
    }

    /// Parses and cleans CSV bytes with the PRSA layout.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::CsvRead`] for malformed CSV, [`DatasetError::MissingColumn`]
    /// when an analysed column is absent and [`DatasetError::EmptyDataset`] when no complete
    /// row is left.
    pub fn from_csv_bytes(bytes: Vec<u8>, origin: &str) -> Result<Self, DatasetError> {
        let raw = DatasetLoader::csv_to_dataframe(bytes, origin)?;
        let frame = DatasetLoader::clean(raw, origin)?;
        Self::from_frame(frame, origin)
    }

    fn from_frame(frame: DataFrame, origin: &str) -> Result<Self, DatasetError> {
        let empty = || DatasetError::EmptyDataset {
            origin: origin.to_string(),
        };

        let dates = dates_of(&frame)?;
        let start_date = dates.iter().min().copied().ok_or_else(empty)?;
        let end_date = dates.iter().max().copied().ok_or_else(empty)?;

        let temperature = frame.column(Variable::Temperature.column())?.f64()?;
        let temp_min = temperature.min().ok_or_else(empty)?;
        let temp_max = temperature.max().ok_or_else(empty)?;

        let pm25_mean = frame
            .column(Variable::Pm25.column())?
            .f64()?
            .mean()
            .ok_or_else(empty)?;

        Ok(Self {
            frame,
            origin: origin.to_string(),
            bounds: DatasetBounds {
                start_date,
                end_date,
                temp_min,
                temp_max,
            },
            pm25_mean,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn bounds(&self) -> &DatasetBounds {
        &self.bounds
    }

    /// Mean PM2.5 over the whole cleaned dataset, the reference for metric deltas.
    pub fn pm25_mean(&self) -> f64 {
        self.pm25_mean
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Station name from the `station` column, if the file carries one.
    pub fn station_name(&self) -> Option<String> {
        self.frame
            .column(STATION_COLUMN)
            .ok()?
            .str()
            .ok()?
            .get(0)
            .map(str::to_string)
    }
}

/// Calendar date of every row, composed from the year/month/day columns.
fn dates_of(frame: &DataFrame) -> Result<Vec<NaiveDate>, DatasetError> {
    let years = frame.column(YEAR_COLUMN)?.i64()?;
    let months = frame.column(MONTH_COLUMN)?.i64()?;
    let days = frame.column(DAY_COLUMN)?.i64()?;
    Ok(years
        .into_iter()
        .zip(months)
        .zip(days)
        .filter_map(|((y, m), d)| {
            NaiveDate::from_ymd_opt(y? as i32, m? as u32, d? as u32)
        })
        .collect())
}


#[cfg(test)]
mod tests {
    use super::test_support::{dataset_from_rows, sample_dataset};
    use super::*;

    #[test]
    fn test_bounds_cover_dataset() {
        let dataset = sample_dataset();
        let bounds = dataset.bounds();
        assert_eq!(bounds.start_date, NaiveDate::from_ymd_opt(2013, 3, 1).unwrap());
        assert_eq!(bounds.end_date, NaiveDate::from_ymd_opt(2013, 4, 30).unwrap());
        assert!((bounds.temp_min - -5.0).abs() < 1e-9);
        assert!(bounds.temp_max > bounds.temp_min);
        assert_eq!(dataset.len(), 61 * 24);
    }

    #[test]
    fn test_pm25_mean_and_station() {
        let dataset = dataset_from_rows(&[(2014, 1, 1, 0, 10.0, 1.0), (2014, 1, 1, 1, 30.0, 2.0)]);
        assert!((dataset.pm25_mean() - 20.0).abs() < 1e-9);
        assert_eq!(dataset.station_name().as_deref(), Some("Aotizhongxin"));
    }

    #[test]
    fn test_cache_file_names() {
        assert_eq!(
            DataSource::Station(Station::Dongsi).cache_file_name(),
            "PRSA_Data_Dongsi_20130301-20170228.csv"
        );
        assert_eq!(
            DataSource::Url("https://example.org/data/my file.csv".into()).cache_file_name(),
            "my_file.csv"
        );
    }
}
