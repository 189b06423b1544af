use crate::aggregation::stats;
use serde::{Deserialize, Serialize};

/// Lower and upper percentiles kept by the outlier filter.
pub const OUTLIER_PERCENTILES: (f64, f64) = (1.0, 99.0);
/// Number of points the density curve is evaluated at.
pub const KDE_GRID_POINTS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    pub x: f64,
    /// Density scaled to histogram counts, so it can share the histogram's axis.
    pub y: f64,
}

/// Descriptive statistics and chart series for the PM2.5 distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Number of values after the optional outlier trim.
    pub count: usize,
    /// `[p1, p99]` band used when the outlier filter was on.
    pub trimmed_to: Option<(f64, f64)>,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    /// Undefined for a single value.
    pub std_dev: Option<f64>,
    pub range: f64,
    pub iqr: f64,
    pub histogram: Vec<HistogramBin>,
    pub kde: Option<Vec<DensityPoint>>,
}

impl DistributionSummary {
    /// Summarises `values`. Returns `None` when there is nothing to summarise,
    /// including after the outlier trim.
    pub fn compute(
        values: &[f64],
        bins: usize,
        trim_outliers: bool,
        with_kde: bool,
    ) -> Option<Self> {
        let (values, trimmed_to) = if trim_outliers {
            let (low, high) = trim_bounds(values)?;
            let kept: Vec<f64> = values
                .iter()
                .copied()
                .filter(|v| *v >= low && *v <= high)
                .collect();
            (kept, Some((low, high)))
        } else {
            (values.to_vec(), None)
        };

        let sorted = stats::sorted(&values);
        let (min, max) = stats::min_max(&sorted)?;
        let q1 = stats::percentile_sorted(&sorted, 25.0)?;
        let q3 = stats::percentile_sorted(&sorted, 75.0)?;
        let histogram = histogram(&sorted, bins);
        let kde = if with_kde {
            kde_curve(&sorted, bin_width(&histogram))
        } else {
            None
        };

        Some(Self {
            count: sorted.len(),
            trimmed_to,
            mean: stats::mean(&sorted)?,
            median: stats::percentile_sorted(&sorted, 50.0)?,
            mode: stats::mode(&sorted)?,
            std_dev: stats::sample_std(&sorted),
            range: max - min,
            iqr: q3 - q1,
            histogram,
            kde,
        })
    }
}

/// `[p1, p99]` of `values`.
pub fn trim_bounds(values: &[f64]) -> Option<(f64, f64)> {
    let sorted = stats::sorted(values);
    Some((
        stats::percentile_sorted(&sorted, OUTLIER_PERCENTILES.0)?,
        stats::percentile_sorted(&sorted, OUTLIER_PERCENTILES.1)?,
    ))
}

/// Equal-width bins over `[min, max]`. Every bin is half-open except the last,
/// which also takes `max`. A zero-width range is widened to `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let Some((mut min, mut max)) = stats::min_max(values) else {
        return Vec::new();
    };
    let bins = bins.max(1);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

fn bin_width(histogram: &[HistogramBin]) -> f64 {
    histogram.first().map(|b| b.upper - b.lower).unwrap_or(1.0)
}

/// Gaussian kernel density estimate with Scott's bandwidth, evaluated on an
/// even grid over the data range and scaled by `n * bin_width`.
///
/// `None` when fewer than two values are given or the values do not vary.
pub fn kde_curve(sorted: &[f64], bin_width: f64) -> Option<Vec<DensityPoint>> {
    let std = stats::sample_std(sorted)?;
    if std == 0.0 {
        return None;
    }
    let n = sorted.len() as f64;
    let bandwidth = std * n.powf(-1.0 / 5.0);
    let (min, max) = stats::min_max(sorted)?;
    let step = (max - min) / (KDE_GRID_POINTS - 1) as f64;
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let scale = n * bin_width;

    Some(
        (0..KDE_GRID_POINTS)
            .map(|i| {
                let x = min + step * i as f64;
                let density: f64 = sorted
                    .iter()
                    .map(|v| {
                        let z = (x - v) / bandwidth;
                        (-0.5 * z * z).exp()
                    })
                    .sum::<f64>()
                    * norm;
                DensityPoint {
                    x,
                    y: density * scale,
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread(n: usize) -> Vec<f64> {
        (0..n).map(|i| ((i * 37) % 101) as f64 + 0.25 * (i % 4) as f64).collect()
    }

    #[test]
    fn test_histogram_counts_sum_to_input() {
        let values = spread(1000);
        for bins in [10, 30, 55, 100] {
            let hist = histogram(&values, bins);
            assert_eq!(hist.len(), bins);
            assert_eq!(hist.iter().map(|b| b.count).sum::<usize>(), values.len());
        }
    }

    #[test]
    fn test_histogram_edges() {
        let hist = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
        let counts: Vec<usize> = hist.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 2]);
        assert_eq!(hist[0].lower, 0.0);
        assert_eq!(hist[3].upper, 4.0);

        let flat = histogram(&[7.0, 7.0, 7.0], 10);
        assert_eq!(flat.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(flat[0].lower, 6.5);
        assert!(histogram(&[], 10).is_empty());
    }

    #[test]
    fn test_summary_statistics() {
        let values = [1.0, 2.0, 2.0, 3.0, 4.0, 10.0];
        let summary = DistributionSummary::compute(&values, 10, false, false).unwrap();
        assert_eq!(summary.count, 6);
        assert!((summary.mean - 22.0 / 6.0).abs() < 1e-12);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.mode, 2.0);
        assert_eq!(summary.range, 9.0);
        assert!((summary.iqr - (3.75 - 2.0)).abs() < 1e-12);
        assert!(summary.std_dev.is_some());
        assert!(summary.kde.is_none());
        assert_eq!(summary.trimmed_to, None);
    }

    #[test]
    fn test_outlier_trim_drops_extremes() {
        let mut values = spread(500);
        values.push(10_000.0);
        values.push(-10_000.0);
        let summary = DistributionSummary::compute(&values, 20, true, false).unwrap();
        let (low, high) = summary.trimmed_to.unwrap();
        assert!(low > -10_000.0 && high < 10_000.0);
        assert!(summary.count < values.len());
        assert_eq!(
            summary.histogram.iter().map(|b| b.count).sum::<usize>(),
            summary.count
        );
    }

    #[test]
    fn test_kde_scaled_to_counts() {
        let values = stats::sorted(&spread(2000));
        let hist = histogram(&values, 20);
        let width = hist[0].upper - hist[0].lower;
        let curve = kde_curve(&values, width).unwrap();
        assert_eq!(curve.len(), KDE_GRID_POINTS);
        // The area under the scaled curve approximates n * bin_width.
        let step = curve[1].x - curve[0].x;
        let area: f64 = curve.iter().map(|p| p.y * step).sum();
        let expected = values.len() as f64 * width;
        assert!((area - expected).abs() / expected < 0.15, "area {}", area);
        assert!(curve.iter().all(|p| p.y >= 0.0));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(DistributionSummary::compute(&[], 30, false, true), None);
        assert_eq!(DistributionSummary::compute(&[], 30, true, true), None);
        let single = DistributionSummary::compute(&[5.0], 30, true, true).unwrap();
        assert_eq!(single.count, 1);
        assert_eq!(single.std_dev, None);
        assert_eq!(single.kde, None);
        assert_eq!(kde_curve(&[3.0, 3.0, 3.0], 1.0), None);
    }
}
