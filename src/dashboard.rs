//! The entry point: loads a station's data once and re-runs the
//! filter, aggregate, present pipeline for every set of controls.

use crate::aggregation::hourly::hourly_means;
use crate::aggregation::monthly::monthly_means;
use crate::aggregation::Aggregates;
use crate::controls::Controls;
use crate::dataset::loader::DatasetLoader;
use crate::dataset::{DataSource, Dataset};
use crate::error::AirQualityError;
use crate::export::{export, ExportPayload};
use crate::filtering::{filter, FilteredView};
use crate::presentation::DashboardView;
use crate::types::station::Station;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use log::info;
use std::path::PathBuf;

/// A loaded dataset plus the means to refresh its download cache.
///
/// # Examples
///
/// ```no_run
/// # use air_quality::{AirQualityError, Dashboard, Station};
/// # #[tokio::main]
/// # async fn main() -> Result<(), AirQualityError> {
/// let dashboard = Dashboard::load().station(Station::Dongsi).call().await?;
///
/// let controls = dashboard.default_controls();
/// let view = dashboard.run(&controls)?;
/// println!("{}", view);
/// # Ok(())
/// # }
/// ```
pub struct Dashboard {
    loader: DatasetLoader,
    source: DataSource,
    dataset: Dataset,
}

#[bon]
impl Dashboard {
    /// Loads and cleans a dataset.
    ///
    /// This method uses a builder pattern.
    ///
    /// * `.station(Station)`: Optional. A PRSA station; [`Station::Aotizhongxin`] by default.
    /// * `.source(DataSource)`: Optional. Any other source; takes precedence over `.station`.
    /// * `.cache_dir(PathBuf)`: Optional. Where downloads are cached. Defaults to
    ///   `air_quality_rs_cache` in the user's cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`AirQualityError::CacheDirResolution`] or [`AirQualityError::CacheDirCreation`]
    /// when no cache directory is available, and [`AirQualityError::Dataset`] when the data
    /// cannot be fetched, parsed or cleaned.
    #[builder]
    pub async fn load(
        station: Option<Station>,
        source: Option<DataSource>,
        cache_dir: Option<PathBuf>,
    ) -> Result<Self, AirQualityError> {
        let loader = prepare_loader(cache_dir).await?;
        let source = source
            .or_else(|| station.map(DataSource::Station))
            .unwrap_or_default();
        let dataset = Dataset::load(&loader, &source).await?;
        info!(
            "Loaded {} observations from {} ({} to {})",
            dataset.len(),
            source,
            dataset.bounds().start_date,
            dataset.bounds().end_date
        );
        Ok(Self {
            loader,
            source,
            dataset,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Controls selecting the whole dataset, with every other setting at its default.
    pub fn default_controls(&self) -> Controls {
        Controls::for_bounds(self.dataset.bounds())
    }

    pub fn run(&self, controls: &Controls) -> Result<DashboardView, AirQualityError> {
        run(&self.dataset, controls)
    }

    /// Serialises the rows selected by `controls` in `controls.export_format`.
    pub fn export(&self, controls: &Controls) -> Result<ExportPayload, AirQualityError> {
        let (controls, view) = select(&self.dataset, controls)?;
        let monthly = monthly_means(&view)?;
        let hourly = hourly_means(&view)?;
        Ok(export(&view, &monthly, &hourly, controls.export_format)?)
    }

    /// Drops the cached download so the next load fetches fresh data.
    pub async fn clear_cache(&self) -> Result<bool, AirQualityError> {
        Ok(self.loader.clear_cache(&self.source).await?)
    }

    /// Drops the cached download of `source` without loading it first, so a
    /// corrupt cache file can be replaced. `cache_dir` defaults as in [`Dashboard::load`].
    pub async fn clear_cache_for(
        source: &DataSource,
        cache_dir: Option<PathBuf>,
    ) -> Result<bool, AirQualityError> {
        let loader = prepare_loader(cache_dir).await?;
        Ok(loader.clear_cache(source).await?)
    }
}

async fn prepare_loader(cache_dir: Option<PathBuf>) -> Result<DatasetLoader, AirQualityError> {
    let cache_dir = match cache_dir {
        Some(dir) => dir,
        None => get_cache_dir().map_err(AirQualityError::CacheDirResolution)?,
    };
    ensure_cache_dir_exists(&cache_dir)
        .await
        .map_err(|e| AirQualityError::CacheDirCreation(cache_dir.clone(), e))?;
    Ok(DatasetLoader::new(&cache_dir))
}

/// Clamps the controls to the dataset and applies the date and temperature filters.
fn select(dataset: &Dataset, controls: &Controls) -> Result<(Controls, FilteredView), AirQualityError> {
    let controls = controls.clone().clamp_to(dataset.bounds());
    let view = filter(
        dataset,
        controls.start_date,
        controls.end_date,
        controls.temp_min,
        controls.temp_max,
    )?;
    info!(
        "Selected {} of {} rows ({} to {}, {:.1} to {:.1} °C)",
        view.len(),
        dataset.len(),
        controls.start_date,
        controls.end_date,
        controls.temp_min,
        controls.temp_max
    );
    Ok((controls, view))
}

/// One full pipeline run over an already loaded dataset.
pub fn run(dataset: &Dataset, controls: &Controls) -> Result<DashboardView, AirQualityError> {
    let (controls, view) = select(dataset, controls)?;
    let aggregates = Aggregates::compute(&view, &controls, dataset.pm25_mean())?;
    Ok(DashboardView::build(dataset, &view, &controls, aggregates)?)
}
