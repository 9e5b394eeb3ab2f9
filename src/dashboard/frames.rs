//! Flattens page views into the column layouts the charts read.

use crate::dashboard::climate_drivers::{index_label, Baseline, Correlation, StormMetric};
use crate::dashboard::explorer::StormPath;
use crate::dashboard::overview::{AnnualCount, ExposureImpact};
use crate::types::intensity::IntensityClass;
use polars::prelude::*;
use std::collections::BTreeMap;

pub const COL_YEAR_LABEL: &str = "year";
pub const COL_VALUE: &str = "value";
pub const COL_ROLLING_MEAN: &str = "rolling_mean";

/// One row per year, one count column per intensity class (`TD`..`STY`).
/// Years without storms of a class hold zero.
pub fn frequency_frame(counts: &[AnnualCount]) -> PolarsResult<DataFrame> {
    let mut by_year: BTreeMap<i32, [i64; 4]> = BTreeMap::new();
    for count in counts {
        by_year.entry(count.year).or_default()[count.intensity as usize] +=
            count.storm_count as i64;
    }

    let mut columns = vec![Column::new(
        COL_YEAR_LABEL.into(),
        by_year.keys().map(|y| y.to_string()).collect::<Vec<_>>(),
    )];
    for class in IntensityClass::ALL {
        columns.push(Column::new(
            class.label().into(),
            by_year
                .values()
                .map(|row| row[class as usize])
                .collect::<Vec<i64>>(),
        ));
    }
    DataFrame::new(columns)
}

/// Class counts of both datasets in long form: `dataset`, `intensity`, `count`.
pub fn class_counts_frame(kpis: &ExposureImpact) -> PolarsResult<DataFrame> {
    let mut datasets = Vec::with_capacity(8);
    let mut labels = Vec::with_capacity(8);
    let mut counts = Vec::with_capacity(8);
    for (name, classes) in [("PAR", &kpis.par_classes), ("Landfall", &kpis.land_classes)] {
        for class in IntensityClass::ALL {
            datasets.push(name);
            labels.push(class.label());
            counts.push(classes.count(class) as i64);
        }
    }
    df!(
        "dataset" => datasets,
        "intensity" => labels,
        "count" => counts
    )
}

/// `year`, `value` and, when computed, `rolling_mean`.
pub fn baseline_frame(baseline: &Baseline) -> PolarsResult<DataFrame> {
    let mut columns = vec![
        Column::new(
            COL_YEAR_LABEL.into(),
            baseline
                .years
                .iter()
                .map(|y| y.to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(COL_VALUE.into(), baseline.values.clone()),
    ];
    if let Some(rolling) = &baseline.rolling {
        columns.push(Column::new(COL_ROLLING_MEAN.into(), rolling.clone()));
    }
    DataFrame::new(columns)
}

/// One heat-map row: `index` label, `metric` name and `coefficient` (null
/// where the correlation is undefined).
pub fn correlation_frame(
    metric: StormMetric,
    correlations: &[Correlation],
) -> PolarsResult<DataFrame> {
    df!(
        "index" => correlations.iter().map(|c| index_label(&c.index).to_string()).collect::<Vec<_>>(),
        "metric" => vec![metric.name(); correlations.len()],
        "coefficient" => correlations.iter().map(|c| c.coefficient).collect::<Vec<_>>()
    )
}

/// Path vertices in long form: `SID`, `lon`, `lat`, `peak_intensity`.
pub fn paths_frame(paths: &[StormPath]) -> PolarsResult<DataFrame> {
    let rows: Vec<(&StormPath, &[f64; 2])> = paths
        .iter()
        .flat_map(|path| path.path.iter().map(move |vertex| (path, vertex)))
        .collect();
    df!(
        "SID" => rows.iter().map(|(p, _)| p.sid.as_str()).collect::<Vec<_>>(),
        "lon" => rows.iter().map(|(_, v)| v[0]).collect::<Vec<_>>(),
        "lat" => rows.iter().map(|(_, v)| v[1]).collect::<Vec<_>>(),
        "peak_intensity" => rows
            .iter()
            .map(|(p, _)| p.peak_intensity.map(IntensityClass::label))
            .collect::<Vec<_>>()
    )
}
