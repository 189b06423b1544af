//! Pairs each aggregate with the chart encoding the user picked.
//!
//! The [`DashboardView`] built here is the complete output of one pipeline run. It
//! serialises to JSON for a front end and renders as text through [`std::fmt::Display`].

pub mod interpretation;
mod report;

use crate::aggregation::correlation::MaskedCorrelation;
use crate::aggregation::distribution::DistributionSummary;
use crate::aggregation::hourly::DiurnalProfile;
use crate::aggregation::monthly::MonthlyMean;
use crate::aggregation::{Aggregates, HeadlineMetrics};
use crate::controls::Controls;
use crate::dataset::Dataset;
use crate::filtering::FilteredView;
use crate::types::chart::{ColorScheme, HourlyChartType, MonthlyChartType, MonthlyViewMode};
use crate::Variable;
use chrono::NaiveDate;
use polars::prelude::{DataType, PolarsResult};
use serde::Serialize;

/// Rows shown in the dataset preview.
pub const SAMPLE_ROWS: usize = 10;

/// The first rows of the view, as display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SampleTable {
    fn from_view(view: &FilteredView) -> PolarsResult<Self> {
        let head = view.frame().head(Some(SAMPLE_ROWS));
        let columns: Vec<String> = head
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut rows = vec![Vec::with_capacity(columns.len()); head.height()];
        for column in head.get_columns() {
            let text = column.cast(&DataType::String)?;
            for (row, value) in rows.iter_mut().zip(text.str()?) {
                row.push(value.unwrap_or_default().to_string());
            }
        }
        Ok(Self { columns, rows })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub station: Option<String>,
    pub origin: String,
    pub period: (NaiveDate, NaiveDate),
    pub observations: usize,
    pub variables: Vec<Variable>,
    pub sample: SampleTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPanel {
    pub view_mode: MonthlyViewMode,
    /// Set when the view mode includes a chart.
    pub chart: Option<MonthlyChartType>,
    pub show_table: bool,
    pub series: Vec<MonthlyMean>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPanel {
    pub color_scheme: ColorScheme,
    pub heatmap: Option<MaskedCorrelation>,
    pub interpretation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionPanel {
    pub bins: usize,
    pub show_kde: bool,
    pub outliers_filtered: bool,
    pub summary: Option<DistributionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiurnalPanel {
    pub chart: HourlyChartType,
    pub annotate_extremes: bool,
    pub profile: DiurnalProfile,
    pub interpretation: Vec<String>,
}

/// Everything one pipeline run produces, ready to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub info: DatasetInfo,
    pub headline: Option<HeadlineMetrics>,
    pub monthly: MonthlyPanel,
    pub correlation: CorrelationPanel,
    pub distribution: DistributionPanel,
    pub diurnal: DiurnalPanel,
}

impl DashboardView {
    /// Assembles the view. Takes the aggregates by value; nothing is recomputed.
    pub fn build(
        dataset: &Dataset,
        view: &FilteredView,
        controls: &Controls,
        aggregates: Aggregates,
    ) -> PolarsResult<Self> {
        let info = DatasetInfo {
            station: dataset.station_name(),
            origin: dataset.origin().to_string(),
            period: (controls.start_date, controls.end_date),
            observations: view.len(),
            variables: Variable::ALL.to_vec(),
            sample: SampleTable::from_view(view)?,
        };

        let correlation_text = aggregates
            .correlation
            .as_ref()
            .and_then(interpretation::correlation_text);
        let diurnal_text = aggregates
            .diurnal
            .extremes
            .as_ref()
            .map(interpretation::diurnal_text)
            .unwrap_or_default();

        Ok(Self {
            info,
            headline: aggregates.headline,
            monthly: MonthlyPanel {
                view_mode: controls.monthly_view,
                chart: controls
                    .monthly_view
                    .shows_chart()
                    .then_some(controls.monthly_chart),
                show_table: controls.monthly_view.shows_table(),
                series: aggregates.monthly,
            },
            correlation: CorrelationPanel {
                color_scheme: controls.color_scheme,
                heatmap: aggregates.masked_correlation,
                interpretation: correlation_text,
            },
            distribution: DistributionPanel {
                bins: controls.bin_count,
                show_kde: controls.show_kde,
                outliers_filtered: controls.filter_outliers,
                summary: aggregates.distribution,
            },
            diurnal: DiurnalPanel {
                chart: controls.hourly_chart,
                annotate_extremes: controls.annotate_extremes,
                profile: aggregates.diurnal,
                interpretation: diurnal_text,
            },
        })
    }

    pub fn is_empty(&self) -> bool {
        self.info.observations == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::sample_dataset;
    use crate::filtering::filter;

    fn build(controls: &Controls, temp: (f64, f64)) -> DashboardView {
        let dataset = sample_dataset();
        let view = filter(&dataset, controls.start_date, controls.end_date, temp.0, temp.1).unwrap();
        let aggregates = Aggregates::compute(&view, controls, dataset.pm25_mean()).unwrap();
        DashboardView::build(&dataset, &view, controls, aggregates).unwrap()
    }

    #[test]
    fn test_view_reflects_controls() {
        let dataset = sample_dataset();
        let controls = Controls {
            monthly_view: MonthlyViewMode::Table,
            hourly_chart: HourlyChartType::Scatter,
            color_scheme: ColorScheme::Magma,
            ..Controls::for_bounds(dataset.bounds())
        };
        let view = build(&controls, (-100.0, 100.0));
        assert_eq!(view.monthly.chart, None);
        assert!(view.monthly.show_table);
        assert_eq!(view.diurnal.chart, HourlyChartType::Scatter);
        assert_eq!(view.correlation.color_scheme, ColorScheme::Magma);
        assert_eq!(view.info.station.as_deref(), Some("Aotizhongxin"));
        assert_eq!(view.info.observations, dataset.len());
        assert_eq!(view.diurnal.interpretation.len(), 2);
        assert!(view.correlation.interpretation.is_some());
    }

    #[test]
    fn test_sample_has_ten_rows_of_every_column() {
        let dataset = sample_dataset();
        let view = build(&Controls::for_bounds(dataset.bounds()), (-100.0, 100.0));
        let sample = &view.info.sample;
        assert_eq!(sample.rows.len(), SAMPLE_ROWS);
        assert_eq!(sample.columns.len(), dataset.frame().width());
        assert!(sample.rows.iter().all(|r| r.len() == sample.columns.len()));
        assert_eq!(sample.rows[0][sample.columns.len() - 1], "2013-03-01");
    }

    #[test]
    fn test_empty_view_serialises() {
        let dataset = sample_dataset();
        let view = build(&Controls::for_bounds(dataset.bounds()), (100.0, 200.0));
        assert!(view.is_empty());
        assert!(view.info.sample.rows.is_empty());
        assert!(view.diurnal.interpretation.is_empty());
        assert_eq!(view.correlation.interpretation, None);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["headline"].is_null());
    }
}
