//! Slice statistics the distribution and diurnal summaries need beyond what the
//! polars aggregations give. Every function returns `None` on input too short for
//! the statistic instead of producing NaN.

use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Percentile `p` (0-100) of already sorted values, linearly interpolated
/// between the closest ranks.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Most frequent value; the smallest one when several share the top count.
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut counts: BTreeMap<OrderedFloat<f64>, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(OrderedFloat(*v)).or_insert(0) += 1;
    }
    // BTreeMap iterates ascending, and max_by_key keeps the last maximum, so reverse.
    counts
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value.into_inner())
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))),
    )
}

/// Index of the first maximum / minimum.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if *v <= b => best,
            _ => Some((i, *v)),
        })
        .map(|(i, _)| i)
}

pub fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if *v >= b => best,
            _ => Some((i, *v)),
        })
        .map(|(i, _)| i)
}
