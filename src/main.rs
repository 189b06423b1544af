//! air-quality: explore PM2.5 levels of a Beijing PRSA monitoring station.

use air_quality::{
    ColorScheme, ControlEvent, Controls, DataSource, Dashboard, ExportFormat, HourlyChartType,
    MonthlyChartType, MonthlyViewMode, Station, Variable,
};
use chrono::NaiveDate;
use clap::Parser;
use log::info;
use std::error::Error;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(
    name = "air-quality",
    version,
    about = "PM2.5 dashboard for the Beijing PRSA air-quality data"
)]
struct Cli {
    /// PRSA station to load.
    #[arg(long, default_value_t = Station::Aotizhongxin)]
    station: Station,
    /// Load a local CSV with the PRSA layout instead of a station.
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,
    /// Load a CSV with the PRSA layout from this URL instead of a station.
    #[arg(long)]
    url: Option<String>,
    /// Download cache location.
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Delete the cached download before loading.
    #[arg(long)]
    refresh: bool,

    /// First day to include (YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD).
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long, allow_hyphen_values = true)]
    temp_min: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    temp_max: Option<f64>,
    /// Hide correlations with |r| below this value.
    #[arg(long)]
    threshold: Option<f64>,
    /// Variables shown in the correlation heatmap, comma separated.
    #[arg(long, value_delimiter = ',')]
    vars: Vec<Variable>,
    /// Histogram bins (10-100).
    #[arg(long)]
    bins: Option<usize>,
    #[arg(long)]
    no_kde: bool,
    /// Trim the distribution to its 1st-99th percentile band.
    #[arg(long)]
    outliers: bool,
    /// Smooth the hourly line chart.
    #[arg(long)]
    smoothing: bool,
    /// Smoothing window, odd and between 3 and 11.
    #[arg(long)]
    window: Option<usize>,
    #[arg(long)]
    no_annotate: bool,
    #[arg(long)]
    monthly_view: Option<MonthlyViewMode>,
    #[arg(long)]
    monthly_chart: Option<MonthlyChartType>,
    #[arg(long)]
    hourly_chart: Option<HourlyChartType>,
    #[arg(long)]
    color_scheme: Option<ColorScheme>,

    /// Export format (csv, xlsx or json).
    #[arg(long)]
    format: Option<ExportFormat>,
    /// Write the filtered data to --out-dir.
    #[arg(long)]
    export: bool,
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Print the dashboard as JSON instead of text.
    #[arg(long)]
    json: bool,
    /// Read `key=value` control changes from stdin and redraw after each one.
    #[arg(long)]
    interactive: bool,
}

impl Cli {
    fn source(&self) -> DataSource {
        if let Some(path) = &self.file {
            DataSource::File(path.clone())
        } else if let Some(url) = &self.url {
            DataSource::Url(url.clone())
        } else {
            DataSource::Station(self.station)
        }
    }

    /// The command-line settings as the events a user would have sent.
    fn events(&self) -> Vec<ControlEvent> {
        let mut events = Vec::new();
        events.extend(self.start.map(ControlEvent::StartDate));
        events.extend(self.end.map(ControlEvent::EndDate));
        events.extend(self.temp_min.map(ControlEvent::TempMin));
        events.extend(self.temp_max.map(ControlEvent::TempMax));
        events.extend(self.threshold.map(ControlEvent::Threshold));
        if !self.vars.is_empty() {
            events.push(ControlEvent::Variables(self.vars.clone()));
        }
        events.extend(self.bins.map(ControlEvent::Bins));
        events.push(ControlEvent::Kde(!self.no_kde));
        events.push(ControlEvent::Outliers(self.outliers));
        events.push(ControlEvent::Smoothing(self.smoothing));
        events.extend(self.window.map(ControlEvent::Window));
        events.push(ControlEvent::Annotate(!self.no_annotate));
        events.extend(self.monthly_view.map(ControlEvent::MonthlyView));
        events.extend(self.monthly_chart.map(ControlEvent::MonthlyChart));
        events.extend(self.hourly_chart.map(ControlEvent::HourlyChart));
        events.extend(self.color_scheme.map(ControlEvent::ColorScheme));
        events.extend(self.format.map(ControlEvent::Format));
        events
    }
}

fn render(dashboard: &Dashboard, controls: &Controls, json: bool) -> Result<(), Box<dyn Error>> {
    let view = dashboard.run(controls)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", view);
    }
    Ok(())
}

fn write_export(dashboard: &Dashboard, controls: &Controls, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let payload = dashboard.export(controls)?;
    let path = payload.write_to(&cli.out_dir)?;
    println!("Exported {} ({}) to {}", payload.file_name, payload.mime, path.display());
    Ok(())
}

async fn load(cli: &Cli) -> Result<Dashboard, Box<dyn Error>> {
    Ok(Dashboard::load()
        .source(cli.source())
        .maybe_cache_dir(cli.cache_dir.clone())
        .call()
        .await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.refresh {
        let source = cli.source();
        if Dashboard::clear_cache_for(&source, cli.cache_dir.clone()).await? {
            info!("Cleared cache, downloading {} again", source);
        }
    }
    let dashboard = load(&cli).await?;
    drive(&dashboard, &cli).await
}

async fn drive(dashboard: &Dashboard, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let bounds = *dashboard.dataset().bounds();
    let mut controls = cli
        .events()
        .into_iter()
        .fold(dashboard.default_controls(), |c, e| c.apply(e, &bounds));

    render(dashboard, &controls, cli.json)?;
    if cli.export {
        write_export(dashboard, &controls, cli)?;
    }
    if !cli.interactive {
        return Ok(());
    }

    eprintln!("Enter key=value to change a control, 'export' to save, 'quit' to exit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            "export" => {
                if let Err(e) = write_export(dashboard, &controls, cli) {
                    eprintln!("Export failed: {}", e);
                }
                continue;
            }
            _ => {}
        }
        match line.parse::<ControlEvent>() {
            Ok(event) => {
                controls = controls.apply(event, &bounds);
                render(dashboard, &controls, cli.json)?;
            }
            Err(e) => eprintln!("{}", e),
        }
    }
    Ok(())
}
