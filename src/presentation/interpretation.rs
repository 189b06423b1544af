//! Plain-language readings of the computed aggregates.

use crate::aggregation::correlation::CorrelationMatrix;
use crate::aggregation::hourly::PeakTrough;
use crate::Variable;

/// Conventional bands for |r|.
pub fn strength(r: f64) -> &'static str {
    match r.abs() {
        a if a >= 0.7 => "strong",
        a if a >= 0.4 => "moderate",
        a if a >= 0.2 => "weak",
        _ => "very weak",
    }
}

/// Describes the selected variable most correlated with PM2.5.
///
/// `None` when PM2.5 or every other variable is left out of the selection, or
/// when no correlation with PM2.5 is defined.
pub fn correlation_text(matrix: &CorrelationMatrix) -> Option<String> {
    let (variable, r) = matrix.strongest_pm25_relation()?;
    let pm25 = Variable::Pm25.column();
    let name = variable.column();
    let direction = if r < 0.0 { "negative" } else { "positive" };
    let tendency = if r < 0.0 {
        format!("when {name} decreases, {pm25} tends to increase, and vice versa")
    } else {
        format!("{pm25} tends to rise and fall together with {name}")
    };
    Some(format!(
        "{name} shows the strongest correlation with {pm25}: a {} {direction} relation (r = {r:.2}). This suggests that {tendency}.",
        strength(r)
    ))
}

/// The hours with the highest and lowest mean PM2.5.
pub fn diurnal_text(extremes: &PeakTrough) -> Vec<String> {
    vec![
        format!(
            "Highest mean PM2.5 at hour {0} ({0:02}:00): {1:.2}",
            extremes.peak.hour, extremes.peak.pm25
        ),
        format!(
            "Lowest mean PM2.5 at hour {0} ({0:02}:00): {1:.2}",
            extremes.trough.hour, extremes.trough.pm25
        ),
    ]
}
