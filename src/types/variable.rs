//! Defines the `Variable` enum, the six numeric columns of the PRSA dataset that
//! take part in the correlation and distribution analyses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column holding the composed calendar date of an observation.
pub const DATE_COLUMN: &str = "date";
/// Column holding the hour of day (0-23).
pub const HOUR_COLUMN: &str = "hour";
pub const YEAR_COLUMN: &str = "year";
pub const MONTH_COLUMN: &str = "month";
pub const DAY_COLUMN: &str = "day";
pub const STATION_COLUMN: &str = "station";

/// A numeric variable measured at the monitoring station.
///
/// The column names match the header of the PRSA CSV files, so
/// `Variable::Pm25.column()` can be used directly in Polars expressions.
///
/// # Examples
///
/// ```
/// use air_quality::Variable;
///
/// assert_eq!(Variable::Pm25.column(), "PM2.5");
/// assert_eq!("wspm".parse::<Variable>().unwrap(), Variable::WindSpeed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variable {
    /// Fine particulate matter concentration (µg/m³).
    #[serde(rename = "PM2.5")]
    Pm25,
    /// Temperature (°C).
    #[serde(rename = "TEMP")]
    Temperature,
    /// Air pressure (hPa).
    #[serde(rename = "PRES")]
    Pressure,
    /// Dew point temperature (°C).
    #[serde(rename = "DEWP")]
    DewPoint,
    /// Precipitation (mm).
    #[serde(rename = "RAIN")]
    Rain,
    /// Wind speed (m/s).
    #[serde(rename = "WSPM")]
    WindSpeed,
}

impl Variable {
    /// All analysed variables, in the canonical matrix order.
    pub const ALL: [Variable; 6] = [
        Variable::Pm25,
        Variable::Temperature,
        Variable::Pressure,
        Variable::DewPoint,
        Variable::Rain,
        Variable::WindSpeed,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Variable::Pm25 => "PM2.5",
            Variable::Temperature => "TEMP",
            Variable::Pressure => "PRES",
            Variable::DewPoint => "DEWP",
            Variable::Rain => "RAIN",
            Variable::WindSpeed => "WSPM",
        }
    }

    /// Human readable name, used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Variable::Pm25 => "PM2.5",
            Variable::Temperature => "Temperature",
            Variable::Pressure => "Air pressure",
            Variable::DewPoint => "Dew point",
            Variable::Rain => "Rainfall",
            Variable::WindSpeed => "Wind speed",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl FromStr for Variable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .into_iter()
            .find(|v| v.column().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown variable '{}'", s))
    }
}
