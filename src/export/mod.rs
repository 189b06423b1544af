//! Serialises the filtered view and the two aggregate tables for download.

pub mod error;

use crate::aggregation::hourly::{hourly_frame, HourlyMean};
use crate::aggregation::monthly::{monthly_frame, MonthlyMean};
use crate::export::error::ExportError;
use crate::filtering::FilteredView;
use log::info;
use polars::prelude::*;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const FILE_STEM: &str = "air_quality_analysis";

pub const DATA_SHEET: &str = "Data";
pub const MONTHLY_SHEET: &str = "Monthly_Avg";
pub const HOURLY_SHEET: &str = "Hourly_Avg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Json];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => "application/vnd.ms-excel",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", FILE_STEM, self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Xlsx => "Excel",
            ExportFormat::Json => "JSON",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("'{}' is not one of: csv, xlsx, json", other)),
        }
    }
}

/// A serialised export, ready to be offered for download or written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPayload {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportPayload {
    /// Writes the payload as `dir/<file_name>` and returns the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes).map_err(|e| ExportError::Io(path.clone(), e))?;
        info!("Wrote {} bytes to {}", self.bytes.len(), path.display());
        Ok(path)
    }
}

/// Serialises the view in `format`.
///
/// CSV and JSON hold the filtered rows only. The workbook adds the monthly and
/// hourly averages as extra sheets.
pub fn export(
    view: &FilteredView,
    monthly: &[MonthlyMean],
    hourly: &[HourlyMean],
    format: ExportFormat,
) -> Result<ExportPayload, ExportError> {
    let mut data = view.frame().clone();
    let bytes = match format {
        ExportFormat::Csv => {
            let mut buf = Vec::new();
            CsvWriter::new(&mut buf)
                .include_header(true)
                .finish(&mut data)?;
            buf
        }
        ExportFormat::Json => {
            let mut buf = Vec::new();
            JsonWriter::new(&mut buf)
                .with_json_format(JsonFormat::Json)
                .finish(&mut data)?;
            buf
        }
        ExportFormat::Xlsx => {
            let mut workbook = Workbook::new();
            write_sheet(workbook.add_worksheet(), DATA_SHEET, &data)?;
            write_sheet(workbook.add_worksheet(), MONTHLY_SHEET, &monthly_frame(monthly)?)?;
            write_sheet(workbook.add_worksheet(), HOURLY_SHEET, &hourly_frame(hourly)?)?;
            workbook.save_to_buffer()?
        }
    };
    info!(
        "Exported {} rows as {} ({} bytes)",
        view.len(),
        format,
        bytes.len()
    );
    Ok(ExportPayload {
        file_name: format.file_name(),
        mime: format.mime(),
        bytes,
    })
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Header row in bold, then one row per frame row. Numbers stay numeric in the
/// sheet; everything else, dates included, is written as text.
fn write_sheet(sheet: &mut Worksheet, name: &str, frame: &DataFrame) -> Result<(), ExportError> {
    sheet.set_name(name)?;
    let header = Format::new().set_bold();

    for (c, column) in frame.get_columns().iter().enumerate() {
        let c = c as u16;
        sheet.write_string_with_format(0, c, column.name().as_str(), &header)?;

        if is_numeric(column.dtype()) {
            let values = column.cast(&DataType::Float64)?;
            for (r, value) in values.f64()?.into_iter().enumerate() {
                if let Some(value) = value {
                    sheet.write_number(r as u32 + 1, c, value)?;
                }
            }
        } else {
            let values = column.cast(&DataType::String)?;
            for (r, value) in values.str()?.into_iter().enumerate() {
                if let Some(value) = value {
                    sheet.write_string(r as u32 + 1, c, value)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::hourly::hourly_means;
    use crate::aggregation::monthly::monthly_means;
    use crate::dataset::test_support::{dataset_from_rows, sample_dataset};
    use crate::filtering::filter;
    use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
    use std::io::Cursor;

    fn view() -> FilteredView {
        let dataset = sample_dataset();
        let b = *dataset.bounds();
        filter(&dataset, b.start_date, b.end_date, 0.0, 10.0).unwrap()
    }

    fn column_names(frame: &DataFrame) -> Vec<String> {
        frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::Csv.file_name(), "air_quality_analysis.csv");
        assert_eq!(ExportFormat::Xlsx.file_name(), "air_quality_analysis.xlsx");
        assert_eq!(ExportFormat::Json.mime(), "application/json");
        assert_eq!(ExportFormat::Xlsx.mime(), "application/vnd.ms-excel");
        assert_eq!("Excel".parse::<ExportFormat>(), Ok(ExportFormat::Xlsx));
        assert!("parquet".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_csv_round_trip_keeps_rows_and_columns() -> Result<(), ExportError> {
        let view = view();
        let payload = export(&view, &[], &[], ExportFormat::Csv)?;
        assert_eq!(payload.mime, "text/csv");

        let parsed = CsvReadOptions::default()
            .with_has_header(true)
            .into_reader_with_file_handle(Cursor::new(payload.bytes))
            .finish()?;
        assert_eq!(parsed.height(), view.len());
        assert_eq!(column_names(&parsed), column_names(view.frame()));
        assert_eq!(column_names(&parsed).last().map(String::as_str), Some("date"));
        Ok(())
    }

    #[test]
    fn test_json_is_array_of_rows() -> Result<(), ExportError> {
        let dataset = dataset_from_rows(&[(2014, 1, 1, 0, 10.0, 1.0), (2014, 1, 2, 3, 20.0, 2.0)]);
        let b = *dataset.bounds();
        let view = filter(&dataset, b.start_date, b.end_date, b.temp_min, b.temp_max)?;
        let payload = export(&view, &[], &[], ExportFormat::Json)?;

        let rows: serde_json::Value = serde_json::from_slice(&payload.bytes).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["PM2.5"], serde_json::json!(20.0));
        assert!(rows[0].get("date").is_some());
        Ok(())
    }

    fn sheet_header(range: &Range<Data>) -> Vec<String> {
        range
            .rows()
            .next()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_xlsx_workbook_has_data_and_summary_sheets() -> Result<(), ExportError> {
        let view = view();
        let monthly = monthly_means(&view)?;
        let hourly = hourly_means(&view)?;
        let payload = export(&view, &monthly, &hourly, ExportFormat::Xlsx)?;
        assert_eq!(payload.file_name, "air_quality_analysis.xlsx");

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(payload.bytes)).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec![DATA_SHEET, MONTHLY_SHEET, HOURLY_SHEET]
        );

        let data = workbook.worksheet_range(DATA_SHEET).unwrap();
        assert_eq!(sheet_header(&data), column_names(view.frame()));
        assert_eq!(data.height(), view.len() + 1);
        let numbers: Vec<f64> = data
            .rows()
            .skip(1)
            .map(|row| match row[0] {
                Data::Float(n) => n,
                _ => f64::NAN,
            })
            .collect();
        let expected: Vec<f64> = view
            .frame()
            .column("No")?
            .cast(&DataType::Float64)?
            .f64()?
            .into_no_null_iter()
            .collect();
        assert_eq!(numbers, expected);

        let monthly_sheet = workbook.worksheet_range(MONTHLY_SHEET).unwrap();
        assert_eq!(monthly_sheet.height(), monthly.len() + 1);
        assert_eq!(sheet_header(&monthly_sheet), vec!["month", "PM2.5", "count"]);
        let hourly_sheet = workbook.worksheet_range(HOURLY_SHEET).unwrap();
        assert_eq!(hourly_sheet.height(), hourly.len() + 1);
        assert_eq!(sheet_header(&hourly_sheet), vec!["hour", "PM2.5", "count"]);
        Ok(())
    }

    #[test]
    fn test_empty_view_exports_header_only() -> Result<(), ExportError> {
        let dataset = sample_dataset();
        let b = *dataset.bounds();
        let view = filter(&dataset, b.start_date, b.end_date, 100.0, 200.0)?;
        let payload = export(&view, &[], &[], ExportFormat::Csv)?;
        let text = String::from_utf8(payload.bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("No,year,month,day,hour,PM2.5"));
        Ok(())
    }

    #[test]
    fn test_write_to_directory() -> Result<(), ExportError> {
        let dir = tempfile::tempdir().unwrap();
        let payload = export(&view(), &[], &[], ExportFormat::Csv)?;
        let path = payload.write_to(dir.path())?;
        assert_eq!(path, dir.path().join("air_quality_analysis.csv"));
        assert_eq!(std::fs::read(path).unwrap(), payload.bytes);
        Ok(())
    }
}
