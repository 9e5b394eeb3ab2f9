//! Exposure (PAR entries) versus impact (landfall) KPIs and annual
//! frequency by intensity class.

use crate::dashboard::data::{StormRecord, StormTable};
use crate::types::intensity::IntensityClass;
use std::collections::{BTreeMap, HashSet};
use std::ops::RangeInclusive;

/// Which storm summary table a view is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dataset {
    /// Storms that entered PAR, labelled by in-PAR peak.
    #[default]
    Par,
    /// Storms that made landfall, labelled by first-landfall intensity.
    Landfall,
}

impl Dataset {
    /// The label a storm is counted under in this dataset, or `None` when the
    /// row does not belong to it.
    pub fn label(self, record: &StormRecord) -> Option<IntensityClass> {
        match self {
            Dataset::Par => record.par_peak_intensity,
            Dataset::Landfall if record.made_landfall() => record.landfall_intensity,
            Dataset::Landfall => None,
        }
    }

    /// Rows of `table` that belong to this dataset.
    pub fn rows(self, table: &StormTable) -> impl Iterator<Item = &StormRecord> {
        table
            .records
            .iter()
            .filter(move |r| self == Dataset::Par || r.made_landfall())
    }
}

/// Storm counts per intensity class. Rows without a known label count
/// toward `total` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassCounts {
    counts: [usize; 4],
    pub total: usize,
}

impl ClassCounts {
    pub fn from_labels(labels: impl IntoIterator<Item = Option<IntensityClass>>) -> Self {
        let mut counts = Self::default();
        for label in labels {
            counts.total += 1;
            if let Some(class) = label {
                counts.counts[class as usize] += 1;
            }
        }
        counts
    }

    pub fn count(&self, class: IntensityClass) -> usize {
        self.counts[class as usize]
    }

    /// Share of rows in `class`, in percent. Zero for an empty set.
    pub fn proportion(&self, class: IntensityClass) -> f64 {
        percent(self.count(class), self.total)
    }

    /// Share of TY and STY rows, in percent.
    pub fn high_share(&self) -> f64 {
        let severe = IntensityClass::ALL
            .iter()
            .filter(|class| class.is_severe())
            .map(|class| self.count(*class))
            .sum();
        percent(severe, self.total)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Headline numbers of the overview page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureImpact {
    /// Distinct PAR storms.
    pub par_total: usize,
    /// Distinct landfall storms.
    pub land_total: usize,
    /// `land_total / par_total` in percent; zero without PAR storms.
    pub conversion_rate: f64,
    pub par_classes: ClassCounts,
    pub land_classes: ClassCounts,
    /// Landfall TY+STY share minus PAR TY+STY share, in percentage points.
    pub severity_shift: f64,
    /// First and last PAR start year.
    pub coverage: Option<(i32, i32)>,
}

pub fn exposure_impact(par: &StormTable, landfall: &StormTable) -> ExposureImpact {
    let par_rows: Vec<&StormRecord> = Dataset::Par.rows(par).collect();
    let land_rows: Vec<&StormRecord> = Dataset::Landfall.rows(landfall).collect();

    let par_total = distinct_sids(&par_rows);
    let land_total = distinct_sids(&land_rows);

    let par_classes = ClassCounts::from_labels(par_rows.iter().map(|r| r.par_peak_intensity));
    let land_classes = ClassCounts::from_labels(land_rows.iter().map(|r| r.landfall_intensity));

    let years = par_rows.iter().filter_map(|r| r.start_year);
    let coverage = years.clone().min().zip(years.max());

    ExposureImpact {
        par_total,
        land_total,
        conversion_rate: percent(land_total, par_total),
        severity_shift: land_classes.high_share() - par_classes.high_share(),
        par_classes,
        land_classes,
        coverage,
    }
}

fn distinct_sids(rows: &[&StormRecord]) -> usize {
    rows.iter()
        .map(|r| r.sid.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// One point of the annual frequency chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnualCount {
    pub year: i32,
    pub intensity: IntensityClass,
    pub storm_count: usize,
}

/// Storms per start year and intensity class, one row per storm.
///
/// Rows with no year or no known label are skipped. Output is sorted by year,
/// then by class from weakest to strongest.
pub fn annual_frequency(
    table: &StormTable,
    dataset: Dataset,
    years: RangeInclusive<i32>,
    classes: &[IntensityClass],
) -> Vec<AnnualCount> {
    let mut counts: BTreeMap<(i32, IntensityClass), usize> = BTreeMap::new();
    for record in table.records.iter() {
        let (Some(year), Some(intensity)) = (record.start_year, dataset.label(record)) else {
            continue;
        };
        if years.contains(&year) && classes.contains(&intensity) {
            *counts.entry((year, intensity)).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|((year, intensity), storm_count)| AnnualCount {
            year,
            intensity,
            storm_count,
        })
        .collect()
}

/// Smallest and largest start year among the dataset's labelled rows, used as
/// the default year range.
pub fn year_bounds(table: &StormTable, dataset: Dataset) -> Option<RangeInclusive<i32>> {
    let years = table
        .records
        .iter()
        .filter(|r| dataset.label(r).is_some())
        .filter_map(|r| r.start_year);
    let min = years.clone().min()?;
    let max = years.max()?;
    Some(min..=max)
}
