use crate::filtering::FilteredView;
use crate::types::variable::{MONTH_COLUMN, YEAR_COLUMN};
use crate::Variable;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

const COUNT_COLUMN: &str = "count";

/// Mean PM2.5 of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMean {
    pub year: i32,
    pub month: u32,
    pub pm25: f64,
    /// Number of observations that went into the mean.
    pub count: usize,
}

impl MonthlyMean {
    /// `YYYY-MM`, the label used on the chart axis and in exports.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Groups the view by calendar month and averages PM2.5.
///
/// Months without observations are absent rather than zero. The result is in
/// chronological order and empty for an empty view.
pub fn monthly_means(view: &FilteredView) -> PolarsResult<Vec<MonthlyMean>> {
    if view.is_empty() {
        return Ok(Vec::new());
    }
    let pm25 = Variable::Pm25.column();
    let grouped = view
        .lazy()
        .group_by([col(YEAR_COLUMN), col(MONTH_COLUMN)])
        .agg([
            col(pm25).mean().alias(pm25),
            col(pm25).count().cast(DataType::Int64).alias(COUNT_COLUMN),
        ])
        .sort_by_exprs(
            [col(YEAR_COLUMN), col(MONTH_COLUMN)],
            SortMultipleOptions::default(),
        )
        .collect()?;

    let years = grouped.column(YEAR_COLUMN)?.i64()?;
    let months = grouped.column(MONTH_COLUMN)?.i64()?;
    let means = grouped.column(pm25)?.f64()?;
    let counts = grouped.column(COUNT_COLUMN)?.i64()?;

    Ok(years
        .into_no_null_iter()
        .zip(months.into_no_null_iter())
        .zip(means.into_no_null_iter())
        .zip(counts.into_no_null_iter())
        .map(|(((year, month), pm25), count)| MonthlyMean {
            year: year as i32,
            month: month as u32,
            pm25,
            count: count as usize,
        })
        .collect())
}

/// The monthly table as exported: `month`, `PM2.5`, `count`.
pub fn monthly_frame(monthly: &[MonthlyMean]) -> PolarsResult<DataFrame> {
    let labels: Vec<String> = monthly.iter().map(MonthlyMean::label).collect();
    let means: Vec<f64> = monthly.iter().map(|m| m.pm25).collect();
    let counts: Vec<u64> = monthly.iter().map(|m| m.count as u64).collect();
    df!(
        MONTH_COLUMN => labels,
        Variable::Pm25.column() => means,
        COUNT_COLUMN => counts,
    )
}
