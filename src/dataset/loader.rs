use crate::dataset::error::DatasetError;
use crate::dataset::DataSource;
use crate::types::variable::{DATE_COLUMN, DAY_COLUMN, HOUR_COLUMN, MONTH_COLUMN, YEAR_COLUMN};
use crate::Variable;
use log::{debug, info, warn};
use polars::frame::DataFrame;
use polars::prelude::*;
use reqwest::Client;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

/// Columns that must be present in every dataset file.
const INTEGER_COLUMNS: [&str; 4] = [YEAR_COLUMN, MONTH_COLUMN, DAY_COLUMN, HOUR_COLUMN];

pub struct DatasetLoader {
    cache_dir: PathBuf,
    download_client: Client,
}

impl DatasetLoader {
    pub fn new(cache_dir: &Path) -> DatasetLoader {
        let download_client = Client::new();
        DatasetLoader {
            cache_dir: cache_dir.to_path_buf(),
            download_client,
        }
    }

    /// Loads, parses and cleans the dataset behind `source`.
    /// Remote sources go through the raw CSV cache.
    pub async fn get_frame(&self, source: &DataSource) -> Result<DataFrame, DatasetError> {
        let origin = source.to_string();
        let raw_bytes = match source {
            DataSource::File(path) => fs::read(path)
                .await
                .map_err(|e| DatasetError::FileRead(path.clone(), e))?,
            DataSource::Station(station) => {
                self.get_cached_or_download(&station.url(), &source.cache_file_name())
                    .await?
            }
            DataSource::Url(url) => {
                self.get_cached_or_download(url, &source.cache_file_name())
                    .await?
            }
        };
        let origin_owned = origin.clone();
        let raw = task::spawn_blocking(move || Self::csv_to_dataframe(raw_bytes, &origin_owned))
            .await??;
        Self::clean(raw, &origin)
    }

    pub(crate) fn cache_path(&self, source: &DataSource) -> PathBuf {
        self.cache_dir.join(source.cache_file_name())
    }

    /// Deletes the cached download for `source`. Local files are never touched.
    /// Returns whether a cache file was removed.
    pub async fn clear_cache(&self, source: &DataSource) -> Result<bool, DatasetError> {
        if matches!(source, DataSource::File(_)) {
            return Ok(false);
        }
        let path = self.cache_path(source);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed cached dataset {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DatasetError::CacheDeletion(path, e)),
        }
    }

    async fn get_cached_or_download(
        &self,
        url: &str,
        cache_filename: &str,
    ) -> Result<Vec<u8>, DatasetError> {
        let cache_path = self.cache_dir.join(cache_filename);

        if fs::metadata(&cache_path).await.is_ok() {
            info!("Cache hit for {} at {:?}", url, cache_path);
            return fs::read(&cache_path)
                .await
                .map_err(|e| DatasetError::CacheRead(cache_path.clone(), e));
        }

        warn!("Cache miss for {}. Downloading.", url);
        let bytes = self.download(url).await?;

        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| DatasetError::CacheDirCreation(self.cache_dir.clone(), e))?;
        Self::cache_bytes(bytes.clone(), &self.cache_dir, &cache_path).await?;
        info!("Cached {} bytes from {} to {:?}", bytes.len(), url, cache_path);

        Ok(bytes)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, DatasetError> {
        info!("Downloading data from {}", url);

        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| DatasetError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    DatasetError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    DatasetError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DatasetError::NetworkRequest(url.to_string(), e))?;
        info!("Successfully downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }

    /// Writes the raw CSV to the cache through a temporary file in the same directory,
    /// so a half-written download never shows up as a cache hit.
    async fn cache_bytes(
        bytes: Vec<u8>,
        cache_dir: &Path,
        path: &Path,
    ) -> Result<(), DatasetError> {
        let dir = cache_dir.to_path_buf();
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let mut temp_file = NamedTempFile::new_in(&dir)
                .map_err(|e| DatasetError::CacheWrite(path_buf.clone(), e))?;
            temp_file
                .write_all(&bytes)
                .map_err(|e| DatasetError::CacheWrite(path_buf.clone(), e))?;
            temp_file
                .persist(&path_buf)
                .map_err(|e| DatasetError::CacheWrite(path_buf.clone(), e.error))?;
            Ok::<(), DatasetError>(())
        })
        .await??;
        Ok(())
    }

    /// Parses raw CSV bytes (with header) into a DataFrame. `NA` and empty fields become nulls.
    pub(crate) fn csv_to_dataframe(bytes: Vec<u8>, origin: &str) -> Result<DataFrame, DatasetError> {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .map_parse_options(|opts| {
                opts.with_null_values(Some(NullValues::AllColumnsSingle("NA".into())))
            })
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| DatasetError::CsvRead {
                origin: origin.to_string(),
                source: e,
            })
    }

    /// Drops incomplete rows, normalises column types and appends the `date` column.
    pub(crate) fn clean(raw: DataFrame, origin: &str) -> Result<DataFrame, DatasetError> {
        let present: Vec<String> = raw
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let required = INTEGER_COLUMNS
            .iter()
            .copied()
            .chain(Variable::ALL.iter().map(|v| v.column()));
        for column in required {
            if !present.iter().any(|name| name == column) {
                return Err(DatasetError::MissingColumn {
                    origin: origin.to_string(),
                    column: column.to_string(),
                });
            }
        }

        let raw_height = raw.height();
        let cleaning_error = |e: PolarsError| DatasetError::Cleaning {
            origin: origin.to_string(),
            source: e,
        };

        let complete = raw.drop_nulls::<String>(None).map_err(cleaning_error)?;

        let mut casts: Vec<Expr> = INTEGER_COLUMNS
            .iter()
            .map(|name| col(*name).cast(DataType::Int64))
            .collect();
        casts.extend(
            Variable::ALL
                .iter()
                .map(|v| col(v.column()).cast(DataType::Float64)),
        );

        // Invalid year/month/day combinations come out of `datetime` as nulls.
        let date = datetime(DatetimeArgs::new(
            col(YEAR_COLUMN),
            col(MONTH_COLUMN),
            col(DAY_COLUMN),
        ))
        .cast(DataType::Date)
        .alias(DATE_COLUMN);

        let frame = complete
            .lazy()
            .with_columns(casts)
            .with_column(date)
            .filter(
                col(HOUR_COLUMN)
                    .gt_eq(lit(0i64))
                    .and(col(HOUR_COLUMN).lt_eq(lit(23i64))),
            )
            .collect()
            .map_err(cleaning_error)?
            .drop_nulls::<String>(None)
            .map_err(cleaning_error)?;

        debug!(
            "Cleaned data from {}: kept {} of {} rows",
            origin,
            frame.height(),
            raw_height
        );

        if frame.height() == 0 {
            return Err(DatasetError::EmptyDataset {
                origin: origin.to_string(),
            });
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::{sample_csv, SAMPLE_HEADER};

    fn load(csv: &str) -> Result<DataFrame, DatasetError> {
        let raw = DatasetLoader::csv_to_dataframe(csv.as_bytes().to_vec(), "test")?;
        DatasetLoader::clean(raw, "test")
    }

    #[test]
    fn test_rows_with_missing_values_are_dropped() -> Result<(), Box<dyn std::error::Error>> {
        let csv = format!(
            "{}\n\
             1,2013,3,1,0,4.0,4.0,4.0,7.0,300.0,77.0,-0.7,1023.0,-18.8,0.0,NNW,4.4,Aotizhongxin\n\
             2,2013,3,1,1,NA,8.0,4.0,7.0,300.0,77.0,-1.1,1023.2,-18.2,0.0,N,4.7,Aotizhongxin\n\
             3,2013,3,1,2,7.0,7.0,5.0,10.0,300.0,73.0,-1.1,1023.5,-18.2,0.0,NA,5.6,Aotizhongxin\n\
             4,2013,3,1,3,6.0,6.0,11.0,11.0,300.0,72.0,-1.4,1024.5,-19.4,0.0,NW,3.1,Aotizhongxin",
            SAMPLE_HEADER
        );
        let frame = load(&csv)?;
        assert_eq!(frame.height(), 2);
        let hours: Vec<i64> = frame.column(HOUR_COLUMN)?.i64()?.into_no_null_iter().collect();
        assert_eq!(hours, vec![0, 3]);
        Ok(())
    }

    #[test]
    fn test_date_column_is_appended_last() -> Result<(), Box<dyn std::error::Error>> {
        let frame = load(&sample_csv())?;
        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names.first().map(String::as_str), Some("No"));
        assert_eq!(names.last().map(String::as_str), Some(DATE_COLUMN));
        assert_eq!(frame.column(DATE_COLUMN)?.dtype(), &DataType::Date);
        assert_eq!(frame.column("PM2.5")?.dtype(), &DataType::Float64);
        Ok(())
    }

    #[test]
    fn test_invalid_dates_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let csv = format!(
            "{}\n\
             1,2013,2,30,0,4.0,4.0,4.0,7.0,300.0,77.0,-0.7,1023.0,-18.8,0.0,NNW,4.4,Aotizhongxin\n\
             2,2013,2,28,0,9.0,8.0,4.0,7.0,300.0,77.0,-1.1,1023.2,-18.2,0.0,N,4.7,Aotizhongxin",
            SAMPLE_HEADER
        );
        let frame = load(&csv)?;
        assert_eq!(frame.height(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_column_is_reported() {
        let csv = "year,month,day,hour,PM2.5\n2013,3,1,0,4.0";
        match load(csv) {
            Err(DatasetError::MissingColumn { column, .. }) => assert_eq!(column, "TEMP"),
            other => panic!("Expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_all_incomplete_rows_is_empty_dataset() {
        let csv = format!(
            "{}\n1,2013,3,1,0,NA,4.0,4.0,7.0,300.0,77.0,-0.7,1023.0,-18.8,0.0,NNW,4.4,Aotizhongxin",
            SAMPLE_HEADER
        );
        assert!(matches!(load(&csv), Err(DatasetError::EmptyDataset { .. })));
    }

    #[tokio::test]
    async fn test_get_frame_from_local_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("station.csv");
        std::fs::write(&path, sample_csv())?;

        let loader = DatasetLoader::new(dir.path());
        let frame = loader.get_frame(&DataSource::File(path)).await?;
        assert!(frame.height() > 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_frame_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DatasetLoader::new(dir.path());
        let result = loader
            .get_frame(&DataSource::File(dir.path().join("missing.csv")))
            .await;
        assert!(matches!(result, Err(DatasetError::FileRead(..))));
    }

    #[tokio::test]
    async fn test_cached_bytes_are_reused() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let source = DataSource::Url("http://127.0.0.1:9/unreachable/cached.csv".to_string());
        let loader = DatasetLoader::new(dir.path());
        std::fs::write(loader.cache_path(&source), sample_csv())?;

        // The URL is unreachable, so this only succeeds through the cache.
        let frame = loader.get_frame(&source).await?;
        assert!(frame.height() > 0);

        assert!(loader.clear_cache(&source).await?);
        assert!(!loader.cache_path(&source).exists());
        assert!(!loader.clear_cache(&source).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_cache_leaves_local_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("station.csv");
        std::fs::write(&path, sample_csv())?;
        let loader = DatasetLoader::new(dir.path());
        assert!(!loader.clear_cache(&DataSource::File(path.clone())).await?);
        assert!(path.exists());
        Ok(())
    }
}
