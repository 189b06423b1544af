//! The four independent summaries computed over a [`FilteredView`], plus the
//! headline metrics shown above the charts.

pub mod correlation;
pub mod distribution;
pub mod hourly;
pub mod monthly;
pub mod smoothing;
pub mod stats;

use crate::aggregation::correlation::{CorrelationMatrix, MaskedCorrelation};
use crate::aggregation::distribution::DistributionSummary;
use crate::aggregation::hourly::{hourly_means, DiurnalProfile};
use crate::aggregation::monthly::{monthly_means, MonthlyMean};
use crate::controls::Controls;
use crate::filtering::FilteredView;
use crate::Variable;
use log::{debug, warn};
use polars::prelude::{ChunkAgg, ChunkQuantile, Float64Chunked, PolarsResult};
use serde::{Deserialize, Serialize};

/// PM2.5 key figures of the view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadlineMetrics {
    pub mean: f64,
    pub max: f64,
    pub median: f64,
    pub count: usize,
    /// View mean minus the mean of the whole dataset.
    pub delta_vs_dataset: f64,
}

impl HeadlineMetrics {
    /// `None` for an empty view.
    pub fn compute(pm25: &Float64Chunked, dataset_mean: f64) -> Option<Self> {
        let mean = pm25.mean()?;
        Some(Self {
            mean,
            max: pm25.max()?,
            median: pm25.median()?,
            count: pm25.len() - pm25.null_count(),
            delta_vs_dataset: mean - dataset_mean,
        })
    }
}

/// Everything the presentation layer needs, computed once per control change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub headline: Option<HeadlineMetrics>,
    pub monthly: Vec<MonthlyMean>,
    /// Correlations of the selected variables, unmasked.
    pub correlation: Option<CorrelationMatrix>,
    /// The same matrix with entries under the threshold hidden.
    pub masked_correlation: Option<MaskedCorrelation>,
    pub distribution: Option<DistributionSummary>,
    pub diurnal: DiurnalProfile,
}

impl Aggregates {
    pub fn compute(
        view: &FilteredView,
        controls: &Controls,
        dataset_mean: f64,
    ) -> PolarsResult<Self> {
        let headline =
            HeadlineMetrics::compute(view.frame().column(Variable::Pm25.column())?.f64()?, dataset_mean);
        let pm25 = view.values(Variable::Pm25)?;

        let monthly = monthly_means(view)?;

        let correlation = CorrelationMatrix::compute(view)?
            .map(|full| full.select(&controls.selected_variables));
        let masked_correlation = correlation
            .as_ref()
            .map(|m| m.mask(controls.correlation_threshold));

        let distribution = DistributionSummary::compute(
            &pm25,
            controls.bin_count,
            controls.filter_outliers,
            controls.show_kde,
        );

        let diurnal = DiurnalProfile::from_means(hourly_means(view)?, smoothing_window(controls));

        debug!(
            "Aggregated {} rows into {} months and {} hours",
            view.len(),
            monthly.len(),
            diurnal.means.len()
        );

        Ok(Self {
            headline,
            monthly,
            correlation,
            masked_correlation,
            distribution,
            diurnal,
        })
    }
}

fn smoothing_window(controls: &Controls) -> Option<usize> {
    if !controls.smoothing_requested() {
        return None;
    }
    if !controls.smoothing_window_is_valid() {
        warn!(
            "Skipping smoothing: window {} must be odd and between 3 and 11",
            controls.smoothing_window
        );
        return None;
    }
    Some(controls.smoothing_window)
}
