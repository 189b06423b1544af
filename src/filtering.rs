use crate::dataset::Dataset;
use crate::types::variable::DATE_COLUMN;
use crate::Variable;
use chrono::NaiveDate;
use polars::prelude::{col, lit, DataFrame, DataType, IntoLazy, LazyFrame, PolarsResult};

pub trait AirQualityFrameFilterExt {
    /// Keeps rows whose `date` lies in `[start_date, end_date]` (inclusive).
    ///
    /// # Returns
    /// A new `LazyFrame` with the filter applied. Type errors surface on `collect`.
    fn filter_dates(self, start_date: NaiveDate, end_date: NaiveDate) -> LazyFrame;

    /// Keeps rows whose `TEMP` lies in `[temp_min, temp_max]` (inclusive).
    fn filter_temperature(self, temp_min: f64, temp_max: f64) -> LazyFrame;
}

impl AirQualityFrameFilterExt for LazyFrame {
    fn filter_dates(self, start_date: NaiveDate, end_date: NaiveDate) -> LazyFrame {
        self.filter(
            col(DATE_COLUMN)
                .cast(DataType::Date)
                .gt_eq(lit(start_date))
                .and(col(DATE_COLUMN).cast(DataType::Date).lt_eq(lit(end_date))),
        )
    }

    fn filter_temperature(self, temp_min: f64, temp_max: f64) -> LazyFrame {
        let temp = Variable::Temperature.column();
        self.filter(
            col(temp)
                .gt_eq(lit(temp_min))
                .and(col(temp).lt_eq(lit(temp_max))),
        )
    }
}

/// The rows of a [`Dataset`] matching the current date and temperature selection,
/// with every column of the dataset in its original order.
///
/// All analyses read from a view; the dataset itself is never modified.
#[derive(Debug, Clone)]
pub struct FilteredView {
    frame: DataFrame,
}

impl FilteredView {
    pub(crate) fn new(frame: DataFrame) -> Self {
        Self { frame }
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

    /// Values of one analysed variable, in row order.
    pub fn values(&self, variable: Variable) -> PolarsResult<Vec<f64>> {
        Ok(self
            .frame
            .column(variable.column())?
            .f64()?
            .into_no_null_iter()
            .collect())
    }
}

/// Selects the rows with `start_date <= date <= end_date` and
/// `temp_min <= TEMP <= temp_max`.
///
/// An empty selection is a valid result; downstream stages report it as "no data".
pub fn filter(
    dataset: &Dataset,
    start_date: NaiveDate,
    end_date: NaiveDate,
    temp_min: f64,
    temp_max: f64,
) -> PolarsResult<FilteredView> {
    let frame = dataset
        .lazy()
        .filter_dates(start_date, end_date)
        .filter_temperature(temp_min, temp_max)
        .collect()?;
    Ok(FilteredView::new(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::{dataset_from_rows, sample_dataset};
    use crate::types::variable::{DAY_COLUMN, MONTH_COLUMN, YEAR_COLUMN};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row_dates(frame: &DataFrame) -> Vec<NaiveDate> {
        let years = frame.column(YEAR_COLUMN).unwrap().i64().unwrap();
        let months = frame.column(MONTH_COLUMN).unwrap().i64().unwrap();
        let days = frame.column(DAY_COLUMN).unwrap().i64().unwrap();
        years
            .into_no_null_iter()
            .zip(months.into_no_null_iter())
            .zip(days.into_no_null_iter())
            .map(|((y, m), d)| date(y as i32, m as u32, d as u32))
            .collect()
    }

    #[test]
    fn test_filter_bounds_are_inclusive() -> PolarsResult<()> {
        let dataset = dataset_from_rows(&[
            (2014, 1, 1, 0, 10.0, -1.0),
            (2014, 1, 2, 0, 20.0, 0.0),
            (2014, 1, 3, 0, 30.0, 5.0),
            (2014, 1, 4, 0, 40.0, 10.0),
            (2014, 1, 5, 0, 50.0, 0.0),
        ]);
        let view = filter(&dataset, date(2014, 1, 2), date(2014, 1, 4), 0.0, 5.0)?;
        assert_eq!(view.values(Variable::Pm25)?, vec![20.0, 30.0]);
        Ok(())
    }

    #[test]
    fn test_view_is_exactly_the_matching_rows() -> PolarsResult<()> {
        let dataset = sample_dataset();
        let (start, end) = (date(2013, 3, 10), date(2013, 4, 5));
        let (tmin, tmax) = (0.0, 6.5);
        let view = filter(&dataset, start, end, tmin, tmax)?;

        let in_bounds = |d: &NaiveDate, t: &f64| *d >= start && *d <= end && *t >= tmin && *t <= tmax;

        let view_dates = row_dates(view.frame());
        let view_temps = view.values(Variable::Temperature)?;
        assert!(view_dates.iter().zip(&view_temps).all(|(d, t)| in_bounds(d, t)));

        let all_dates = row_dates(dataset.frame());
        let all_temps: Vec<f64> = dataset
            .frame()
            .column("TEMP")?
            .f64()?
            .into_no_null_iter()
            .collect();
        let expected = all_dates
            .iter()
            .zip(&all_temps)
            .filter(|(d, t)| in_bounds(d, t))
            .count();
        assert_eq!(view.len(), expected);
        assert!(view.len() > 0 && view.len() < dataset.len());
        Ok(())
    }

    #[test]
    fn test_view_keeps_columns_and_order() -> PolarsResult<()> {
        let dataset = sample_dataset();
        let bounds = *dataset.bounds();
        let view = filter(&dataset, bounds.start_date, bounds.end_date, bounds.temp_min, bounds.temp_max)?;
        assert_eq!(view.len(), dataset.len());
        assert_eq!(view.frame().get_column_names(), dataset.frame().get_column_names());
        Ok(())
    }

    #[test]
    fn test_no_matching_rows_gives_empty_view() -> PolarsResult<()> {
        let dataset = sample_dataset();
        let bounds = *dataset.bounds();
        let view = filter(
            &dataset,
            bounds.start_date,
            bounds.end_date,
            bounds.temp_max + 1.0,
            bounds.temp_max + 2.0,
        )?;
        assert!(view.is_empty());

        let outside = filter(&dataset, date(2020, 1, 1), date(2020, 12, 31), -50.0, 50.0)?;
        assert!(outside.is_empty());
        assert!(outside.values(Variable::Pm25)?.is_empty());
        Ok(())
    }
}
