use crate::aggregation::{smoothing, stats};
use crate::filtering::FilteredView;
use crate::types::variable::HOUR_COLUMN;
use crate::Variable;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

const COUNT_COLUMN: &str = "count";

/// Mean PM2.5 for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyMean {
    pub hour: u32,
    pub pm25: f64,
    pub count: usize,
}

/// The hours with the highest and lowest mean PM2.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakTrough {
    pub peak: HourlyMean,
    pub trough: HourlyMean,
}

/// The diurnal pattern: hourly means plus the optional smoothed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiurnalProfile {
    pub means: Vec<HourlyMean>,
    /// Same length as `means` when smoothing was requested and possible.
    pub smoothed: Option<Vec<f64>>,
    pub extremes: Option<PeakTrough>,
}

impl DiurnalProfile {
    pub fn from_means(means: Vec<HourlyMean>, smoothing_window: Option<usize>) -> Self {
        let series: Vec<f64> = means.iter().map(|m| m.pm25).collect();
        let smoothed =
            smoothing_window.and_then(|window| smoothing::savgol_quadratic(&series, window));
        let extremes = peak_trough(&means);
        Self {
            means,
            smoothed,
            extremes,
        }
    }
}

/// Groups the view by hour of day and averages PM2.5.
///
/// Only hours with at least one observation appear, in ascending order.
pub fn hourly_means(view: &FilteredView) -> PolarsResult<Vec<HourlyMean>> {
    if view.is_empty() {
        return Ok(Vec::new());
    }
    let pm25 = Variable::Pm25.column();
    let grouped = view
        .lazy()
        .group_by([col(HOUR_COLUMN)])
        .agg([
            col(pm25).mean().alias(pm25),
            col(pm25).count().cast(DataType::Int64).alias(COUNT_COLUMN),
        ])
        .sort_by_exprs([col(HOUR_COLUMN)], SortMultipleOptions::default())
        .collect()?;

    let hours = grouped.column(HOUR_COLUMN)?.i64()?;
    let means = grouped.column(pm25)?.f64()?;
    let counts = grouped.column(COUNT_COLUMN)?.i64()?;

    Ok(hours
        .into_no_null_iter()
        .zip(means.into_no_null_iter())
        .zip(counts.into_no_null_iter())
        .map(|((hour, pm25), count)| HourlyMean {
            hour: hour as u32,
            pm25,
            count: count as usize,
        })
        .collect())
}

/// Peak and trough hours. On ties the earliest hour wins.
pub fn peak_trough(means: &[HourlyMean]) -> Option<PeakTrough> {
    let values: Vec<f64> = means.iter().map(|m| m.pm25).collect();
    Some(PeakTrough {
        peak: means[stats::argmax(&values)?],
        trough: means[stats::argmin(&values)?],
    })
}

/// The hourly table as exported: `hour`, `PM2.5`, `count`.
pub fn hourly_frame(hourly: &[HourlyMean]) -> PolarsResult<DataFrame> {
    let hours: Vec<u32> = hourly.iter().map(|h| h.hour).collect();
    let means: Vec<f64> = hourly.iter().map(|h| h.pm25).collect();
    let counts: Vec<u64> = hourly.iter().map(|h| h.count as u64).collect();
    df!(
        HOUR_COLUMN => hours,
        Variable::Pm25.column() => means,
        COUNT_COLUMN => counts,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::{dataset_from_rows, sample_dataset};
    use crate::filtering::filter;

    fn mean(hour: u32, pm25: f64) -> HourlyMean {
        HourlyMean {
            hour,
            pm25,
            count: 1,
        }
    }

    #[test]
    fn test_peak_and_trough() {
        let means = [mean(0, 10.0), mean(1, 40.0), mean(2, 5.0)];
        let extremes = peak_trough(&means).unwrap();
        assert_eq!((extremes.peak.hour, extremes.peak.pm25), (1, 40.0));
        assert_eq!((extremes.trough.hour, extremes.trough.pm25), (2, 5.0));
    }

    #[test]
    fn test_ties_go_to_lowest_hour() {
        let means = [mean(3, 8.0), mean(5, 9.0), mean(7, 9.0), mean(9, 8.0)];
        let extremes = peak_trough(&means).unwrap();
        assert_eq!(extremes.peak.hour, 5);
        assert_eq!(extremes.trough.hour, 3);
        assert_eq!(peak_trough(&[]), None);
    }

    #[test]
    fn test_hourly_means_only_observed_hours() -> PolarsResult<()> {
        let dataset = dataset_from_rows(&[
            (2014, 1, 1, 6, 10.0, 1.0),
            (2014, 1, 2, 6, 30.0, 1.0),
            (2014, 1, 1, 2, 50.0, 1.0),
            (2014, 1, 3, 23, 5.0, 1.0),
        ]);
        let b = *dataset.bounds();
        let view = filter(&dataset, b.start_date, b.end_date, b.temp_min, b.temp_max)?;
        let means = hourly_means(&view)?;
        assert_eq!(
            means,
            vec![
                HourlyMean { hour: 2, pm25: 50.0, count: 1 },
                HourlyMean { hour: 6, pm25: 20.0, count: 2 },
                HourlyMean { hour: 23, pm25: 5.0, count: 1 },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_full_day_profile_with_smoothing() -> PolarsResult<()> {
        let dataset = sample_dataset();
        let b = *dataset.bounds();
        let view = filter(&dataset, b.start_date, b.end_date, b.temp_min, b.temp_max)?;
        let means = hourly_means(&view)?;
        assert_eq!(means.len(), 24);
        assert_eq!(means.iter().map(|m| m.count).sum::<usize>(), view.len());

        let profile = DiurnalProfile::from_means(means, Some(5));
        let smoothed = profile.smoothed.as_ref().unwrap();
        assert_eq!(smoothed.len(), 24);
        // PM2.5 rises linearly through the day in the fixture.
        let extremes = profile.extremes.unwrap();
        assert_eq!(extremes.peak.hour, 23);
        assert_eq!(extremes.trough.hour, 0);
        Ok(())
    }

    #[test]
    fn test_short_series_skips_smoothing() {
        let profile = DiurnalProfile::from_means(vec![mean(0, 1.0), mean(1, 2.0), mean(2, 4.0)], Some(5));
        assert_eq!(profile.smoothed, None);
        assert_eq!(profile.means.len(), 3);

        let empty = DiurnalProfile::from_means(Vec::new(), Some(3));
        assert_eq!(empty.smoothed, None);
        assert_eq!(empty.extremes, None);
    }

    #[test]
    fn test_hourly_frame_columns() -> PolarsResult<()> {
        let frame = hourly_frame(&[mean(0, 1.0), mean(1, 2.0)])?;
        let names: Vec<String> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["hour", "PM2.5", "count"]);
        assert_eq!(frame.height(), 2);
        Ok(())
    }
}
