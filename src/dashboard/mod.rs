//! Read-only views over the processed datasets, one per dashboard page.
//!
//! [`Dashboard`] owns the dataset locations and a [`FrameCache`]; every
//! loader and view goes through that cache. Pages are built independently so
//! a failure on one page never hides the others.

pub mod cache;
pub mod climate_drivers;
pub mod data;
pub mod error;
pub mod explorer;
pub mod frames;
pub mod overview;
#[cfg(feature = "dashboard")]
pub mod render;

pub use cache::{CacheKey, FrameCache};
pub use climate_drivers::{Baseline, Correlation, StormMetric, YearMetrics};
pub use data::{ClimateTable, DataSources, StormRecord, StormTable, TrackRecord, TrackTable};
pub use error::DashboardError;
pub use explorer::{ColorMode, ExplorerFilter, ExplorerView, StormPath};
pub use overview::{AnnualCount, ClassCounts, Dataset, ExposureImpact};

use crate::constants::{END_YEAR, START_YEAR};
use crate::types::intensity::IntensityClass;
use log::{info, warn};
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Overview,
    ClimateDrivers,
    Explorer,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Overview, Page::ClimateDrivers, Page::Explorer];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::ClimateDrivers => "Climate Drivers",
            Page::Explorer => "Spatio-Temporal Explorer",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Exposure/impact KPIs and the annual frequency chart.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewPage {
    pub kpis: ExposureImpact,
    pub dataset: Dataset,
    pub frequency: Vec<AnnualCount>,
}

/// Baselines, annual storm metrics and their correlation row.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateDriversPage {
    pub dataset: Dataset,
    pub metric: StormMetric,
    pub baselines: Vec<Baseline>,
    pub metrics: Vec<YearMetrics>,
    pub correlations: Vec<Correlation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    Overview(Arc<OverviewPage>),
    ClimateDrivers(Arc<ClimateDriversPage>),
    Explorer(Arc<ExplorerView>),
}

/// Dashboard state: where the data lives and what has been computed so far.
#[derive(Default)]
pub struct Dashboard {
    sources: DataSources,
    cache: FrameCache,
}

impl Dashboard {
    pub fn new(sources: DataSources) -> Self {
        Self {
            sources,
            cache: FrameCache::new(),
        }
    }

    pub fn sources(&self) -> &DataSources {
        &self.sources
    }

    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    /// Drops every cached dataset and view, e.g. after re-running a cleaning
    /// stage.
    pub async fn refresh(&self) {
        self.cache.clear().await;
        info!("Dashboard cache cleared");
    }

    pub async fn overview(
        &self,
        dataset: Dataset,
        years: RangeInclusive<i32>,
        classes: &[IntensityClass],
    ) -> Result<Arc<OverviewPage>, DashboardError> {
        let key = CacheKey::new("overview", &(&self.sources, dataset, &years, classes));
        self.cache
            .get_or_try_insert_with(key, || async {
                let par = data::par_storms(&self.cache, &self.sources).await?;
                let landfall = data::landfall_storms(&self.cache, &self.sources).await?;
                let table = match dataset {
                    Dataset::Par => &par,
                    Dataset::Landfall => &landfall,
                };
                Ok::<_, DashboardError>(OverviewPage {
                    kpis: overview::exposure_impact(&par, &landfall),
                    dataset,
                    frequency: overview::annual_frequency(table, dataset, years.clone(), classes),
                })
            })
            .await
    }

    pub async fn climate_drivers(
        &self,
        dataset: Dataset,
        metric: StormMetric,
        indices: &[&str],
        years: RangeInclusive<i32>,
        rolling: bool,
    ) -> Result<Arc<ClimateDriversPage>, DashboardError> {
        let key = CacheKey::new(
            "climate_drivers",
            &(&self.sources, dataset, metric, indices, &years, rolling),
        );
        self.cache
            .get_or_try_insert_with(key, || async {
                let climate = data::climate(&self.cache, &self.sources).await?;
                let storms = match dataset {
                    Dataset::Par => data::par_storms(&self.cache, &self.sources).await?,
                    Dataset::Landfall => data::landfall_storms(&self.cache, &self.sources).await?,
                };
                let metrics = climate_drivers::storm_year_metrics(&storms, dataset);
                Ok::<_, DashboardError>(ClimateDriversPage {
                    dataset,
                    metric,
                    baselines: climate_drivers::baselines(
                        &climate,
                        indices,
                        years.clone(),
                        rolling,
                    )?,
                    correlations: climate_drivers::correlation_row(
                        &climate,
                        &metrics,
                        metric,
                        years.clone(),
                    ),
                    metrics,
                })
            })
            .await
    }

    pub async fn explorer(
        &self,
        filter: &ExplorerFilter,
    ) -> Result<Arc<ExplorerView>, DashboardError> {
        let key = CacheKey::new("explorer", &(&self.sources, filter));
        self.cache
            .get_or_try_insert_with(key, || async {
                let storms = data::landfall_storms(&self.cache, &self.sources).await?;
                let tracks = data::landfall_tracks(&self.cache, &self.sources).await?;
                Ok::<_, DashboardError>(explorer::explore(&storms, &tracks, filter))
            })
            .await
    }

    /// Builds one page with its default selections.
    pub async fn page(&self, page: Page) -> Result<PageContent, DashboardError> {
        let years = START_YEAR..=END_YEAR;
        match page {
            Page::Overview => self
                .overview(Dataset::Par, years, &IntensityClass::ALL)
                .await
                .map(PageContent::Overview),
            Page::ClimateDrivers => self
                .climate_drivers(
                    Dataset::Par,
                    StormMetric::default(),
                    &climate_drivers::DEFAULT_BASELINE_INDICES,
                    years,
                    true,
                )
                .await
                .map(PageContent::ClimateDrivers),
            Page::Explorer => self
                .explorer(&ExplorerFilter::default())
                .await
                .map(PageContent::Explorer),
        }
    }

    /// Builds every page. A failing page is logged and returned as its error;
    /// the remaining pages are still built.
    pub async fn pages(&self) -> Vec<(Page, Result<PageContent, DashboardError>)> {
        let mut out = Vec::with_capacity(Page::ALL.len());
        for page in Page::ALL {
            let result = self.page(page).await;
            if let Err(e) = &result {
                warn!("{} page failed: {}", page, e);
            }
            out.push((page, result));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::data::fixtures;
    use super::*;

    #[tokio::test]
    async fn test_every_page_builds() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = Dashboard::new(fixtures::sources(dir.path()).await);

        let pages = dashboard.pages().await;
        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|(_, result)| result.is_ok()));

        match &pages[0].1 {
            Ok(PageContent::Overview(page)) => {
                assert_eq!(page.kpis.par_total, 5);
                assert_eq!(page.kpis.land_total, 2);
                assert_eq!(page.kpis.conversion_rate, 40.0);
            }
            other => panic!("expected overview, got {:?}", other),
        }
        match &pages[2].1 {
            Ok(PageContent::Explorer(view)) => {
                let sids: Vec<&str> = view.paths.iter().map(|p| p.sid.as_str()).collect();
                assert_eq!(sids, vec!["P1", "P3"]);
            }
            other => panic!("expected explorer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failing_page_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = fixtures::sources(dir.path()).await;
        sources.climate = dir.path().join("missing.csv");
        let dashboard = Dashboard::new(sources);

        let pages = dashboard.pages().await;
        assert!(pages[0].1.is_ok());
        assert!(matches!(
            pages[1],
            (Page::ClimateDrivers, Err(DashboardError::FileNotFound(_)))
        ));
        assert!(pages[2].1.is_ok());
    }

    #[tokio::test]
    async fn test_views_are_cached_until_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = Dashboard::new(fixtures::sources(dir.path()).await);
        let filter = ExplorerFilter::default();

        let first = dashboard.explorer(&filter).await.unwrap();
        let second = dashboard.explorer(&filter).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        // Two loaders and one view
        assert_eq!(dashboard.cache().len().await, 3);

        dashboard.refresh().await;
        assert!(dashboard.cache().is_empty().await);
        let third = dashboard.explorer(&filter).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[tokio::test]
    async fn test_climate_drivers_page() {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = Dashboard::new(fixtures::sources(dir.path()).await);
        let page = dashboard
            .climate_drivers(
                Dataset::Par,
                StormMetric::StormCount,
                &["cdd", "rx5day"],
                2000..=2002,
                false,
            )
            .await
            .unwrap();

        assert_eq!(page.baselines.len(), 2);
        let years: Vec<i32> = page.metrics.iter().map(|m| m.year).collect();
        assert_eq!(years, vec![2000, 2001, 2002]);
        // storm_count per year is 2, 1, 2 and cdd is 1, 2, 3
        let cdd = page.correlations.iter().find(|c| c.index == "cdd").unwrap();
        assert!(cdd.coefficient.unwrap().abs() < 1e-12);
        let rx5day = page.correlations.iter().find(|c| c.index == "rx5day").unwrap();
        assert_eq!(rx5day.coefficient, None);

        let unknown = dashboard
            .climate_drivers(
                Dataset::Par,
                StormMetric::StormCount,
                &["tas"],
                2000..=2002,
                false,
            )
            .await;
        assert!(matches!(unknown, Err(DashboardError::UnknownIndex(_))));
    }
}
