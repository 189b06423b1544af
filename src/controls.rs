//! The dashboard's control values, passed explicitly into every pipeline stage.
//!
//! A [`Controls`] value is plain data. The driver owns one, applies
//! [`ControlEvent`]s to it as the user interacts, and hands it to
//! [`crate::Dashboard::run`] each time.

use crate::dataset::DatasetBounds;
use crate::export::ExportFormat;
use crate::types::chart::{ColorScheme, HourlyChartType, MonthlyChartType, MonthlyViewMode};
use crate::Variable;
use bon::Builder;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

pub const MIN_BIN_COUNT: usize = 10;
pub const MAX_BIN_COUNT: usize = 100;
pub const MIN_SMOOTHING_WINDOW: usize = 3;
pub const MAX_SMOOTHING_WINDOW: usize = 11;

#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("Expected 'key=value', got '{0}'")]
    Malformed(String),

    #[error("Unknown control '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for control '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Every user-adjustable setting of the dashboard.
///
/// Only the date and temperature ranges are required; everything else starts at
/// the dashboard defaults. Use [`Controls::for_bounds`] to select the whole dataset.
///
/// # Examples
///
/// ```
/// use air_quality::{Controls, Variable};
/// use chrono::NaiveDate;
///
/// let controls = Controls::builder()
///     .start_date(NaiveDate::from_ymd_opt(2014, 1, 1).unwrap())
///     .end_date(NaiveDate::from_ymd_opt(2014, 12, 31).unwrap())
///     .temp_min(-10.0)
///     .temp_max(35.0)
///     .bin_count(50)
///     .selected_variables(vec![Variable::Pm25, Variable::WindSpeed])
///     .build();
/// assert!(controls.show_kde);
/// assert_eq!(controls.smoothing_window, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Controls {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Correlations with an absolute value below this are hidden in the heatmap.
    #[builder(default = 0.0)]
    pub correlation_threshold: f64,
    #[builder(default = Variable::ALL.to_vec())]
    pub selected_variables: Vec<Variable>,
    #[builder(default = 30)]
    pub bin_count: usize,
    #[builder(default = true)]
    pub show_kde: bool,
    /// Trim the distribution to its 1st-99th percentile band.
    #[builder(default)]
    pub filter_outliers: bool,
    /// Only takes effect with the hourly line chart.
    #[builder(default)]
    pub smoothing: bool,
    #[builder(default = 5)]
    pub smoothing_window: usize,
    #[builder(default = true)]
    pub annotate_extremes: bool,
    #[builder(default = MonthlyViewMode::Chart)]
    pub monthly_view: MonthlyViewMode,
    #[builder(default = MonthlyChartType::Line)]
    pub monthly_chart: MonthlyChartType,
    #[builder(default = HourlyChartType::Line)]
    pub hourly_chart: HourlyChartType,
    #[builder(default = ColorScheme::Viridis)]
    pub color_scheme: ColorScheme,
    #[builder(default = ExportFormat::Csv)]
    pub export_format: ExportFormat,
}

impl Controls {
    /// Dashboard defaults with the date and temperature ranges spanning the dataset.
    pub fn for_bounds(bounds: &DatasetBounds) -> Self {
        Controls::builder()
            .start_date(bounds.start_date)
            .end_date(bounds.end_date)
            .temp_min(bounds.temp_min)
            .temp_max(bounds.temp_max)
            .build()
    }

    /// Keeps every control inside the range a slider or picker would allow.
    ///
    /// A date or temperature range overlapping the dataset has its endpoints pulled
    /// into the dataset's extent. An inverted range, or one entirely outside the
    /// extent, is left untouched and selects no rows.
    pub fn clamp_to(mut self, bounds: &DatasetBounds) -> Self {
        (self.start_date, self.end_date) = clamp_range(
            (self.start_date, self.end_date),
            (bounds.start_date, bounds.end_date),
        );

        if self.temp_min.is_nan() {
            self.temp_min = bounds.temp_min;
        }
        if self.temp_max.is_nan() {
            self.temp_max = bounds.temp_max;
        }
        (self.temp_min, self.temp_max) = clamp_range(
            (self.temp_min, self.temp_max),
            (bounds.temp_min, bounds.temp_max),
        );

        self.correlation_threshold = if self.correlation_threshold.is_nan() {
            0.0
        } else {
            self.correlation_threshold.clamp(0.0, 1.0)
        };
        self.bin_count = self.bin_count.clamp(MIN_BIN_COUNT, MAX_BIN_COUNT);
        self
    }

    /// True when the smoothing window is odd and inside the allowed range.
    pub fn smoothing_window_is_valid(&self) -> bool {
        self.smoothing_window % 2 == 1
            && (MIN_SMOOTHING_WINDOW..=MAX_SMOOTHING_WINDOW).contains(&self.smoothing_window)
    }

    /// Whether the hourly series should be smoothed for the current chart choice.
    pub fn smoothing_requested(&self) -> bool {
        self.smoothing && self.hourly_chart == HourlyChartType::Line
    }

    /// Applies one interaction and re-clamps the result.
    pub fn apply(self, event: ControlEvent, bounds: &DatasetBounds) -> Self {
        let mut next = self;
        match event {
            ControlEvent::StartDate(d) => next.start_date = d,
            ControlEvent::EndDate(d) => next.end_date = d,
            ControlEvent::TempMin(t) => next.temp_min = t,
            ControlEvent::TempMax(t) => next.temp_max = t,
            ControlEvent::Threshold(t) => next.correlation_threshold = t,
            ControlEvent::Variables(vars) => next.selected_variables = vars,
            ControlEvent::Bins(bins) => next.bin_count = bins,
            ControlEvent::Kde(on) => next.show_kde = on,
            ControlEvent::Outliers(on) => next.filter_outliers = on,
            ControlEvent::Smoothing(on) => next.smoothing = on,
            ControlEvent::Window(w) => next.smoothing_window = w,
            ControlEvent::Annotate(on) => next.annotate_extremes = on,
            ControlEvent::MonthlyView(mode) => next.monthly_view = mode,
            ControlEvent::MonthlyChart(chart) => next.monthly_chart = chart,
            ControlEvent::HourlyChart(chart) => next.hourly_chart = chart,
            ControlEvent::ColorScheme(scheme) => next.color_scheme = scheme,
            ControlEvent::Format(format) => next.export_format = format,
            ControlEvent::Reset => next = Controls::for_bounds(bounds),
        }
        next.clamp_to(bounds)
    }
}

/// Pulls `(low, high)` into `(min, max)` when the two ranges overlap.
fn clamp_range<T: PartialOrd + Copy>((low, high): (T, T), (min, max): (T, T)) -> (T, T) {
    if low > high || low > max || high < min {
        return (low, high);
    }
    (
        if low < min { min } else { low },
        if high > max { max } else { high },
    )
}

/// A single user interaction, written as `key=value` (or `reset`).
///
/// # Examples
///
/// ```
/// use air_quality::ControlEvent;
///
/// let event: ControlEvent = "bins=45".parse().unwrap();
/// assert_eq!(event, ControlEvent::Bins(45));
/// assert!("colour=red".parse::<ControlEvent>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    StartDate(NaiveDate),
    EndDate(NaiveDate),
    TempMin(f64),
    TempMax(f64),
    Threshold(f64),
    Variables(Vec<Variable>),
    Bins(usize),
    Kde(bool),
    Outliers(bool),
    Smoothing(bool),
    Window(usize),
    Annotate(bool),
    MonthlyView(MonthlyViewMode),
    MonthlyChart(MonthlyChartType),
    HourlyChart(HourlyChartType),
    ColorScheme(ColorScheme),
    Format(ExportFormat),
    Reset,
}

fn invalid(key: &str, value: &str, reason: impl ToString) -> ControlError {
    ControlError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ControlError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.parse::<T>().map_err(|e| invalid(key, value, e))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ControlError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, value, "expected on/off")),
    }
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, ControlError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| invalid(key, value, e))
}

impl FromStr for ControlEvent {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("reset") {
            return Ok(ControlEvent::Reset);
        }
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| ControlError::Malformed(s.to_string()))?;
        let (key, value) = (key.trim(), value.trim());

        let event = match key.to_ascii_lowercase().as_str() {
            "start" => ControlEvent::StartDate(parse_date(key, value)?),
            "end" => ControlEvent::EndDate(parse_date(key, value)?),
            "temp_min" => ControlEvent::TempMin(parse_value(key, value)?),
            "temp_max" => ControlEvent::TempMax(parse_value(key, value)?),
            "threshold" => ControlEvent::Threshold(parse_value(key, value)?),
            "vars" => ControlEvent::Variables(
                value
                    .split(',')
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| parse_value(key, v))
                    .collect::<Result<_, _>>()?,
            ),
            "bins" => ControlEvent::Bins(parse_value(key, value)?),
            "kde" => ControlEvent::Kde(parse_flag(key, value)?),
            "outliers" => ControlEvent::Outliers(parse_flag(key, value)?),
            "smoothing" => ControlEvent::Smoothing(parse_flag(key, value)?),
            "window" => ControlEvent::Window(parse_value(key, value)?),
            "annotate" => ControlEvent::Annotate(parse_flag(key, value)?),
            "monthly_view" => ControlEvent::MonthlyView(parse_value(key, value)?),
            "monthly_chart" => ControlEvent::MonthlyChart(parse_value(key, value)?),
            "hourly_chart" => ControlEvent::HourlyChart(parse_value(key, value)?),
            "color_scheme" => ControlEvent::ColorScheme(parse_value(key, value)?),
            "format" => ControlEvent::Format(parse_value(key, value)?),
            _ => return Err(ControlError::UnknownKey(key.to_string())),
        };
        Ok(event)
    }
}
