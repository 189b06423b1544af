//! Chart-type and style selections. These are pure display choices and never
//! influence the numbers computed by the aggregation stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! named_choice {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|choice| choice.label().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| {
                        let options: Vec<&str> = $name::ALL.iter().map(|c| c.label()).collect();
                        format!("'{}' is not one of: {}", s, options.join(", "))
                    })
            }
        }
    };
}

named_choice!(
    /// Whether the monthly trend is shown as a chart, a table, or both.
    MonthlyViewMode {
        Chart => "chart",
        Table => "table",
        Both => "both",
    }
);

named_choice!(
    /// Visual encoding of the monthly trend.
    MonthlyChartType {
        Line => "line",
        Bar => "bar",
        Area => "area",
    }
);

named_choice!(
    /// Visual encoding of the diurnal pattern.
    HourlyChartType {
        Line => "line",
        Bar => "bar",
        Scatter => "scatter",
        Area => "area",
    }
);

named_choice!(
    /// Color map used for the correlation heatmap.
    ColorScheme {
        Viridis => "viridis",
        Plasma => "plasma",
        Magma => "magma",
        Inferno => "inferno",
        Cividis => "cividis",
    }
);

impl MonthlyViewMode {
    pub fn shows_chart(&self) -> bool {
        matches!(self, MonthlyViewMode::Chart | MonthlyViewMode::Both)
    }

    pub fn shows_table(&self) -> bool {
        matches!(self, MonthlyViewMode::Table | MonthlyViewMode::Both)
    }
}
