//! The parameterized IBTrACS cleaning pipeline.
//!
//! One pipeline covers both retention criteria: storms that entered a region
//! (the PAR) and storms that crossed a landmass. Variants are expressed as
//! [`CleaningConfig`] presets plus the boundaries handed to [`StormPipeline`].

use crate::constants::{END_YEAR, START_YEAR, TROPICAL_NATURES, WIND_COLUMN};
use crate::geometry::convention::{is_valid_latitude, is_valid_longitude};
use crate::geometry::Boundary;
use crate::tracks::aggregate::{sort_tracks, summarize_storms, Scopes};
use crate::tracks::dedup::{deduplicate, DuplicatePolicy};
use crate::tracks::error::TrackError;
use crate::tracks::extractor::extract_points;
use crate::tracks::filtering::TrackFrameFilterExt;
use crate::tracks::loader::TrackLoader;
use crate::tracks::writer::{write_storms_csv, write_tracks_csv};
use crate::types::storm::StormSummary;
use crate::types::track::{CleanTrack, TrackPoint};
use bon::{bon, Builder};
use log::{info, warn};
use polars::prelude::{DataFrame, IntoLazy};
use std::collections::BTreeSet;
use std::path::Path;
use tokio::task;

/// Which boundary decides whether a storm is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Storms with at least one point inside the region boundary.
    Region,
    /// Storms with at least one point on the landmass boundary.
    Landfall,
}

impl Retention {
    fn boundary_kind(self) -> &'static str {
        match self {
            Retention::Region => "region",
            Retention::Landfall => "landmass",
        }
    }
}

/// Parameters of one cleaning run.
///
/// ```
/// use island_storms::tracks::{CleaningConfig, Retention};
///
/// let config = CleaningConfig::builder()
///     .start_year(1980)
///     .retain_by(Retention::Landfall)
///     .build();
/// assert_eq!(config.end_year, 2023);
/// assert!(config.keep_natures.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct CleaningConfig {
    /// First year kept (inclusive).
    #[builder(default = START_YEAR)]
    pub start_year: i32,
    /// Last year kept (inclusive).
    #[builder(default = END_YEAR)]
    pub end_year: i32,
    /// The single wind column used throughout, so all storms share one standard.
    #[builder(into, default = WIND_COLUMN.to_string())]
    pub wind_column: String,
    /// `NATURE` codes to keep. `None` keeps every category.
    pub keep_natures: Option<Vec<String>>,
    #[builder(default)]
    pub duplicate_policy: DuplicatePolicy,
    #[builder(default = Retention::Region)]
    pub retain_by: Retention,
    /// Keep the whole history of a retained storm, not only its matching rows.
    #[builder(default = true)]
    pub keep_full_track: bool,
}

impl CleaningConfig {
    /// Tropical systems (TD, TS, TY) that entered the region.
    pub fn par_entry() -> Self {
        Self::builder()
            .keep_natures(TROPICAL_NATURES.iter().map(|n| n.to_string()).collect())
            .retain_by(Retention::Region)
            .build()
    }

    /// Every category, retained when it touched the landmass.
    pub fn landfall() -> Self {
        Self::builder().retain_by(Retention::Landfall).build()
    }
}

/// Row counters collected while cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub raw_rows: usize,
    /// Rows missing the identifier, time, position or wind after coercion.
    pub incomplete_rows: usize,
    pub unparseable_times: usize,
    /// Rows with a latitude or longitude outside the valid ranges.
    pub invalid_positions: usize,
    pub outside_years: usize,
    pub nature_filtered: usize,
    pub retained_storms: usize,
    pub duplicates_removed: usize,
    pub conflicting_duplicates: usize,
    /// Retained storms lacking the aggregate of their retention boundary.
    pub missing_scoped_aggregates: usize,
    pub track_rows: usize,
}

/// Cleaned detail rows and their storm summaries.
#[derive(Debug, Clone)]
pub struct CleaningOutput {
    pub tracks: Vec<CleanTrack>,
    pub storms: Vec<StormSummary>,
    pub report: CleaningReport,
    pub scopes: Scopes,
    pub wind_column: String,
}

impl CleaningOutput {
    /// Writes the detail and summary CSVs, creating parent directories.
    pub async fn write(&self, tracks_path: &Path, storms_path: &Path) -> Result<(), TrackError> {
        write_tracks_csv(&self.tracks, &self.wind_column, self.scopes, tracks_path).await?;
        write_storms_csv(&self.storms, self.scopes, storms_path).await?;
        info!(
            "Saved {} track rows to {:?} and {} storms to {:?}",
            self.tracks.len(),
            tracks_path,
            self.storms.len(),
            storms_path
        );
        Ok(())
    }
}

/// Cleans raw track records against up to two boundaries.
#[derive(Debug, Clone)]
pub struct StormPipeline {
    config: CleaningConfig,
    region: Option<Boundary>,
    landmass: Option<Boundary>,
}

#[bon]
impl StormPipeline {
    /// Creates a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::MissingBoundary`] when the boundary named by
    /// `config.retain_by` was not supplied.
    #[builder]
    pub fn new(
        config: CleaningConfig,
        region: Option<Boundary>,
        landmass: Option<Boundary>,
    ) -> Result<Self, TrackError> {
        let has_retention_boundary = match config.retain_by {
            Retention::Region => region.is_some(),
            Retention::Landfall => landmass.is_some(),
        };
        if !has_retention_boundary {
            return Err(TrackError::MissingBoundary(config.retain_by.boundary_kind()));
        }
        Ok(Self {
            config,
            region,
            landmass,
        })
    }

    /// The PAR-entry pipeline with the hard-coded PAR polygon.
    pub fn par_entry() -> Self {
        Self {
            config: CleaningConfig::par_entry(),
            region: Some(Boundary::philippine_area_of_responsibility()),
            landmass: None,
        }
    }

    /// The landfall pipeline with the given landmass boundary.
    pub fn landfall(landmass: Boundary) -> Self {
        Self {
            config: CleaningConfig::landfall(),
            region: None,
            landmass: Some(landmass),
        }
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    fn scopes(&self) -> Scopes {
        Scopes {
            region: self.region.is_some(),
            landfall: self.landmass.is_some(),
        }
    }

    /// Loads the raw CSV at `input` and cleans it.
    pub async fn run(&self, input: &Path) -> Result<CleaningOutput, TrackError> {
        let raw = TrackLoader::new(&self.config.wind_column).load(input).await?;
        let pipeline = self.clone();
        task::spawn_blocking(move || pipeline.clean_frame(raw)).await?
    }

    /// Runs the pipeline on `input` and writes both CSV artifacts.
    pub async fn run_and_write(
        &self,
        input: &Path,
        tracks_path: &Path,
        storms_path: &Path,
    ) -> Result<CleaningOutput, TrackError> {
        let output = self.run(input).await?;
        output.write(tracks_path, storms_path).await?;
        Ok(output)
    }

    /// Cleans a raw frame holding the required columns as text.
    pub fn clean_frame(&self, raw: DataFrame) -> Result<CleaningOutput, TrackError> {
        let wind = self.config.wind_column.as_str();
        let mut report = CleaningReport {
            raw_rows: raw.height(),
            ..Default::default()
        };

        let complete = raw
            .lazy()
            .coerce_track_types(wind)
            .drop_incomplete(wind)
            .collect()?;
        report.incomplete_rows = report.raw_rows - complete.height();
        if report.incomplete_rows > 0 {
            warn!(
                "Dropped {} rows with missing or unparseable SID, ISO_TIME, LAT, LON or {}",
                report.incomplete_rows, wind
            );
        }

        let categorized = match &self.config.keep_natures {
            Some(natures) => {
                let before = complete.height();
                let kept = complete.lazy().filter_natures(natures).collect()?;
                report.nature_filtered = before - kept.height();
                kept
            }
            None => complete,
        };

        let extracted = extract_points(&categorized, wind)?;
        report.unparseable_times = extracted.unparseable_times;
        report.invalid_positions = extracted.invalid_positions;
        if extracted.unparseable_times > 0 || extracted.invalid_positions > 0 {
            warn!(
                "Dropped {} rows with unparseable times and {} rows with out-of-range positions",
                extracted.unparseable_times, extracted.invalid_positions
            );
        }

        self.finish(extracted.points, report)
    }

    /// Cleans already-typed track points.
    ///
    /// Points with a non-finite wind count as incomplete and points outside
    /// the valid latitude/longitude ranges as invalid positions; both are
    /// dropped. Then applies the year window, the category filter and every
    /// later stage.
    pub fn clean_points(&self, mut points: Vec<TrackPoint>) -> Result<CleaningOutput, TrackError> {
        let mut report = CleaningReport {
            raw_rows: points.len(),
            ..Default::default()
        };

        points.retain(|p| p.wind.is_finite());
        report.incomplete_rows = report.raw_rows - points.len();
        let before = points.len();
        points.retain(|p| is_valid_latitude(p.lat) && is_valid_longitude(p.lon));
        report.invalid_positions = before - points.len();
        if report.incomplete_rows > 0 || report.invalid_positions > 0 {
            warn!(
                "Dropped {} points without a wind value and {} points with out-of-range positions",
                report.incomplete_rows, report.invalid_positions
            );
        }

        let points = match &self.config.keep_natures {
            Some(natures) => {
                let before = points.len();
                let kept: Vec<TrackPoint> = points
                    .into_iter()
                    .filter(|p| {
                        p.nature
                            .as_deref()
                            .map(str::trim)
                            .is_some_and(|n| natures.iter().any(|keep| keep == n))
                    })
                    .collect();
                report.nature_filtered = before - kept.len();
                kept
            }
            None => points,
        };
        self.finish(points, report)
    }

    fn finish(
        &self,
        points: Vec<TrackPoint>,
        mut report: CleaningReport,
    ) -> Result<CleaningOutput, TrackError> {
        let before = points.len();
        let points: Vec<TrackPoint> = points
            .into_iter()
            .filter(|p| (self.config.start_year..=self.config.end_year).contains(&p.year()))
            .collect();
        report.outside_years = before - points.len();

        let tracks = self.classify(points)?;

        let retained: BTreeSet<String> = tracks
            .iter()
            .filter(|t| self.matches_retention(t))
            .map(|t| t.point.sid.clone())
            .collect();
        report.retained_storms = retained.len();
        if retained.is_empty() {
            warn!(
                "No storms touched the {} boundary after filtering. Output files will be empty.",
                self.config.retain_by.boundary_kind()
            );
        }

        let tracks: Vec<CleanTrack> = tracks
            .into_iter()
            .filter(|t| {
                if self.config.keep_full_track {
                    retained.contains(&t.point.sid)
                } else {
                    self.matches_retention(t)
                }
            })
            .collect();

        let deduped = deduplicate(tracks, self.config.duplicate_policy);
        report.duplicates_removed = deduped.removed;
        report.conflicting_duplicates = deduped.conflicting_groups;

        let mut tracks = deduped.points;
        sort_tracks(&mut tracks);
        let storms = summarize_storms(&tracks, self.scopes());

        report.missing_scoped_aggregates = storms
            .iter()
            .filter(|storm| match self.config.retain_by {
                Retention::Region => storm.region.as_ref().map_or(true, |r| r.max_wind.is_none()),
                Retention::Landfall => storm.landfall.as_ref().map_or(true, |l| l.first.is_none()),
            })
            .count();
        if report.missing_scoped_aggregates > 0 {
            warn!(
                "{} retained storms have no {} aggregate, left missing",
                report.missing_scoped_aggregates,
                self.config.retain_by.boundary_kind()
            );
        }
        report.track_rows = tracks.len();

        info!(
            "Cleaned {} track rows into {} storms",
            report.track_rows,
            storms.len()
        );

        Ok(CleaningOutput {
            tracks,
            storms,
            report,
            scopes: self.scopes(),
            wind_column: self.config.wind_column.clone(),
        })
    }

    /// Attaches the longitude in the -180..180 convention and the membership
    /// flags of every configured boundary.
    fn classify(&self, points: Vec<TrackPoint>) -> Result<Vec<CleanTrack>, TrackError> {
        let positions: Vec<(f64, f64)> = points.iter().map(|p| (p.lon, p.lat)).collect();
        let in_region = self
            .region
            .as_ref()
            .map(|boundary| boundary.membership(&positions))
            .transpose()?;
        let on_land = self
            .landmass
            .as_ref()
            .map(|boundary| boundary.membership(&positions))
            .transpose()?;

        Ok(points
            .into_iter()
            .enumerate()
            .map(|(idx, point)| CleanTrack {
                lon_180: point.lon_180(),
                in_region: in_region.as_ref().map(|flags| flags[idx]),
                on_land: on_land.as_ref().map(|flags| flags[idx]),
                point,
            })
            .collect())
    }

    fn matches_retention(&self, track: &CleanTrack) -> bool {
        match self.config.retain_by {
            Retention::Region => track.in_region == Some(true),
            Retention::Landfall => track.on_land == Some(true),
        }
    }
}
