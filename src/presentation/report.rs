use crate::presentation::{
    CorrelationPanel, DashboardView, DistributionPanel, DiurnalPanel, MonthlyPanel,
};
use std::fmt::{self, Display, Formatter};

const NO_DATA: &str = "No data for the current selection.";

impl Display for DashboardView {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let info = &self.info;
        writeln!(f, "== PM2.5 air quality dashboard ==")?;
        writeln!(
            f,
            "Station: {}",
            info.station.as_deref().unwrap_or(info.origin.as_str())
        )?;
        writeln!(f, "Period: {} to {}", info.period.0, info.period.1)?;
        writeln!(f, "Observations: {}", info.observations)?;
        let variables: Vec<&str> = info.variables.iter().map(|v| v.label()).collect();
        writeln!(f, "Variables: {}", variables.join(", "))?;
        writeln!(f)?;

        match &self.headline {
            Some(h) => {
                writeln!(
                    f,
                    "Mean PM2.5: {:.2} ({:+.2} vs. full dataset)",
                    h.mean, h.delta_vs_dataset
                )?;
                writeln!(f, "Max PM2.5: {:.2}", h.max)?;
                writeln!(f, "Median PM2.5: {:.2}", h.median)?;
                writeln!(f, "Count: {}", h.count)?;
            }
            None => writeln!(f, "{}", NO_DATA)?,
        }
        writeln!(f)?;

        write!(
            f,
            "{}{}{}{}",
            self.monthly, self.correlation, self.distribution, self.diurnal
        )?;

        if !info.sample.rows.is_empty() {
            writeln!(f, "-- Sample ({} rows) --", info.sample.rows.len())?;
            writeln!(f, "{}", info.sample.columns.join(" | "))?;
            for row in &info.sample.rows {
                writeln!(f, "{}", row.join(" | "))?;
            }
        }
        Ok(())
    }
}

impl Display for MonthlyPanel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let encoding = match self.chart {
            Some(chart) => format!("{} chart", chart),
            None => "table".to_string(),
        };
        writeln!(f, "-- Monthly mean PM2.5 ({}) --", encoding)?;
        if self.series.is_empty() {
            writeln!(f, "{}", NO_DATA)?;
        }
        for m in &self.series {
            writeln!(f, "{}  {:>8.2}  (n={})", m.label(), m.pm25, m.count)?;
        }
        writeln!(f)
    }
}

impl Display for CorrelationPanel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- Correlation matrix ({}) --", self.color_scheme)?;
        let Some(heatmap) = &self.heatmap else {
            writeln!(f, "{}", NO_DATA)?;
            return writeln!(f);
        };
        if heatmap.variables.is_empty() {
            writeln!(f, "No variables selected.")?;
            return writeln!(f);
        }
        write!(f, "{:>6}", "")?;
        for v in &heatmap.variables {
            write!(f, " {:>6}", v.column())?;
        }
        writeln!(f)?;
        for (v, row) in heatmap.variables.iter().zip(&heatmap.cells) {
            write!(f, "{:>6}", v.column())?;
            for cell in row {
                match cell {
                    Some(r) => write!(f, " {:>6.2}", r)?,
                    None => write!(f, " {:>6}", "·")?,
                }
            }
            writeln!(f)?;
        }
        if heatmap.threshold > 0.0 {
            writeln!(f, "Hidden: |r| < {:.2}", heatmap.threshold)?;
        }
        if let Some(text) = &self.interpretation {
            writeln!(f, "{}", text)?;
        }
        writeln!(f)
    }
}

impl Display for DistributionPanel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- PM2.5 distribution ({} bins) --", self.bins)?;
        let Some(s) = &self.summary else {
            writeln!(f, "{}", NO_DATA)?;
            return writeln!(f);
        };
        if let Some((low, high)) = s.trimmed_to {
            writeln!(f, "Outliers removed outside [{:.2}, {:.2}]", low, high)?;
        }
        writeln!(f, "Mean: {:.2}", s.mean)?;
        writeln!(f, "Median: {:.2}", s.median)?;
        writeln!(f, "Mode: {:.2}", s.mode)?;
        match s.std_dev {
            Some(std) => writeln!(f, "Std. deviation: {:.2}", std)?,
            None => writeln!(f, "Std. deviation: n/a")?,
        }
        writeln!(f, "Range: {:.2}", s.range)?;
        writeln!(f, "IQR: {:.2}", s.iqr)?;
        let peak = s.histogram.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        for bin in &s.histogram {
            let bar = "#".repeat(bin.count * 40 / peak);
            writeln!(f, "[{:>8.2}, {:>8.2}) {:>6} {}", bin.lower, bin.upper, bin.count, bar)?;
        }
        if self.show_kde && s.kde.is_none() {
            writeln!(f, "Density curve unavailable for this selection.")?;
        }
        writeln!(f)
    }
}

impl Display for DiurnalPanel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- Hourly mean PM2.5 ({} chart) --", self.chart)?;
        let profile = &self.profile;
        if profile.means.is_empty() {
            writeln!(f, "{}", NO_DATA)?;
            return writeln!(f);
        }
        for (i, m) in profile.means.iter().enumerate() {
            write!(f, "{:02}:00  {:>8.2}", m.hour, m.pm25)?;
            if let Some(smoothed) = &profile.smoothed {
                write!(f, "  smoothed {:>8.2}", smoothed[i])?;
            }
            if self.annotate_extremes {
                if let Some(extremes) = &profile.extremes {
                    if extremes.peak.hour == m.hour {
                        write!(f, "  <- peak")?;
                    } else if extremes.trough.hour == m.hour {
                        write!(f, "  <- trough")?;
                    }
                }
            }
            writeln!(f)?;
        }
        for line in &self.interpretation {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}
