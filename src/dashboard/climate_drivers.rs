//! Climate baselines and their association with annual storm activity.

use crate::dashboard::data::{ClimateTable, StormTable, CLIMATE_INDICES};
use crate::dashboard::error::DashboardError;
use crate::dashboard::overview::Dataset;
use crate::types::intensity::IntensityClass;
use log::warn;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::RangeInclusive;

/// Indices shown on the baseline page when nothing is selected.
pub const DEFAULT_BASELINE_INDICES: [&str; 4] = ["rx1day", "rx5day", "cwd", "r50mm"];

/// Window of the smoothing overlay on baseline charts, in years.
pub const ROLLING_WINDOW: usize = 5;

/// Fewest paired observations a correlation is computed from.
pub const MIN_CORRELATION_SAMPLES: usize = 3;

/// Human-readable name of a climate index.
pub fn index_label(index: &str) -> &str {
    match index {
        "cdd" => "CDD (Consecutive Dry Days)",
        "cwd" => "CWD (Consecutive Wet Days)",
        "rx1day" => "Rx1day (Max 1-day precip)",
        "rx5day" => "Rx5day (Max 5-day precip)",
        "pr" => "PR (Mean precip)",
        "prpercent" => "PR% (Precip anomaly %)",
        "r20mm" => "R20mm (Days ≥ 20mm)",
        "r50mm" => "R50mm (Days ≥ 50mm)",
        "r95ptot" => "R95pTOT (% precip from very wet days)",
        other => other,
    }
}

/// One index over the selected years.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub index: String,
    pub label: String,
    pub years: Vec<i32>,
    pub values: Vec<Option<f64>>,
    /// Trailing mean over [`ROLLING_WINDOW`] years, when requested.
    pub rolling: Option<Vec<Option<f64>>>,
}

/// Builds one baseline series per requested index within `years`.
///
/// The rolling mean is computed after the year filter, so the first years of a
/// narrowed range are averaged over fewer values.
///
/// # Errors
///
/// [`DashboardError::UnknownIndex`] when a requested name is not a climate
/// index. Known indices absent from the table are skipped with a warning.
pub fn baselines(
    climate: &ClimateTable,
    indices: &[&str],
    years: RangeInclusive<i32>,
    rolling: bool,
) -> Result<Vec<Baseline>, DashboardError> {
    let selected: Vec<usize> = climate
        .years
        .iter()
        .enumerate()
        .filter(|(_, year)| years.contains(year))
        .map(|(idx, _)| idx)
        .collect();

    let mut out = Vec::with_capacity(indices.len());
    for &index in indices {
        if !CLIMATE_INDICES.contains(&index) {
            return Err(DashboardError::UnknownIndex(index.to_string()));
        }
        let Some(series) = climate.index(index) else {
            warn!("Climate table has no '{}' column, skipping", index);
            continue;
        };
        let values: Vec<Option<f64>> = selected.iter().map(|&idx| series[idx]).collect();
        out.push(Baseline {
            index: index.to_string(),
            label: index_label(index).to_string(),
            years: selected.iter().map(|&idx| climate.years[idx]).collect(),
            rolling: rolling.then(|| rolling_mean(&values, ROLLING_WINDOW, 1)),
            values,
        });
    }
    Ok(out)
}

/// Trailing mean over `window` values, skipping missing ones. A position with
/// fewer than `min_periods` present values is missing.
pub fn rolling_mean(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|end| {
            let start = (end + 1).saturating_sub(window);
            let present: Vec<f64> = values[start..=end].iter().flatten().copied().collect();
            if present.is_empty() || present.len() < min_periods {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            }
        })
        .collect()
}

/// Annual storm metric that can be correlated with climate indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StormMetric {
    #[default]
    StormCount,
    TdCount,
    TsCount,
    TyStyCount,
    MeanMaxWind,
}

impl StormMetric {
    pub const ALL: [StormMetric; 5] = [
        StormMetric::StormCount,
        StormMetric::TdCount,
        StormMetric::TsCount,
        StormMetric::TyStyCount,
        StormMetric::MeanMaxWind,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StormMetric::StormCount => "storm_count",
            StormMetric::TdCount => "td_count",
            StormMetric::TsCount => "ts_count",
            StormMetric::TyStyCount => "ty_sty_count",
            StormMetric::MeanMaxWind => "mean_max_wind",
        }
    }

    pub fn value(self, metrics: &YearMetrics) -> Option<f64> {
        match self {
            StormMetric::StormCount => Some(metrics.storm_count as f64),
            StormMetric::TdCount => Some(metrics.td_count as f64),
            StormMetric::TsCount => Some(metrics.ts_count as f64),
            StormMetric::TyStyCount => Some(metrics.ty_sty_count as f64),
            StormMetric::MeanMaxWind => metrics.mean_max_wind,
        }
    }
}

impl fmt::Display for StormMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storm activity of one start year. Counts are distinct storms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YearMetrics {
    pub year: i32,
    pub storm_count: usize,
    /// Mean of the storms' lifetime `max_wind`; `None` when no storm has one.
    pub mean_max_wind: Option<f64>,
    pub td_count: usize,
    pub ts_count: usize,
    pub ty_count: usize,
    pub sty_count: usize,
    pub ty_sty_count: usize,
}

#[derive(Default)]
struct YearAccumulator<'a> {
    storms: HashSet<&'a str>,
    classes: [HashSet<&'a str>; 4],
    wind_sum: f64,
    wind_n: usize,
}

/// Aggregates a storm table into one row per start year, sorted by year.
///
/// Class counts use the dataset's label: in-PAR peak for [`Dataset::Par`],
/// first-landfall intensity for [`Dataset::Landfall`], where rows flagged as
/// non-landfall are dropped first.
pub fn storm_year_metrics(table: &StormTable, dataset: Dataset) -> Vec<YearMetrics> {
    let mut years: BTreeMap<i32, YearAccumulator> = BTreeMap::new();
    for record in dataset.rows(table) {
        let Some(year) = record.start_year else {
            continue;
        };
        let acc = years.entry(year).or_default();
        acc.storms.insert(&record.sid);
        if let Some(wind) = record.max_wind.filter(|w| !w.is_nan()) {
            acc.wind_sum += wind;
            acc.wind_n += 1;
        }
        if let Some(class) = dataset.label(record) {
            acc.classes[class as usize].insert(&record.sid);
        }
    }

    years
        .into_iter()
        .map(|(year, acc)| {
            let count = |class: IntensityClass| acc.classes[class as usize].len();
            let ty_count = count(IntensityClass::Typhoon);
            let sty_count = count(IntensityClass::SuperTyphoon);
            YearMetrics {
                year,
                storm_count: acc.storms.len(),
                mean_max_wind: (acc.wind_n > 0).then(|| acc.wind_sum / acc.wind_n as f64),
                td_count: count(IntensityClass::TropicalDepression),
                ts_count: count(IntensityClass::TropicalStorm),
                ty_count,
                sty_count,
                ty_sty_count: ty_count + sty_count,
            }
        })
        .collect()
}

/// A climate year joined with the storm metrics of the same year.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateStormYear {
    pub year: i32,
    /// Index values in the climate table's index order.
    pub climate: Vec<Option<f64>>,
    pub metrics: YearMetrics,
}

/// Inner join of climate and storm metrics on year, limited to `years`.
pub fn join_by_year(
    climate: &ClimateTable,
    metrics: &[YearMetrics],
    years: RangeInclusive<i32>,
) -> Vec<ClimateStormYear> {
    let by_year: BTreeMap<i32, &YearMetrics> = metrics.iter().map(|m| (m.year, m)).collect();
    climate
        .years
        .iter()
        .enumerate()
        .filter(|(_, year)| years.contains(year))
        .filter_map(|(idx, year)| {
            let metrics = by_year.get(year)?;
            Some(ClimateStormYear {
                year: *year,
                climate: climate.series.iter().map(|(_, values)| values[idx]).collect(),
                metrics: (*metrics).clone(),
            })
        })
        .collect()
}

/// Correlation of one climate index with the selected storm metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub index: String,
    /// `None` renders as "NA".
    pub coefficient: Option<f64>,
}

/// Pearson correlation of `metric` against every index of `climate`, over
/// the years both tables share within `years`.
pub fn correlation_row(
    climate: &ClimateTable,
    metrics: &[YearMetrics],
    metric: StormMetric,
    years: RangeInclusive<i32>,
) -> Vec<Correlation> {
    let joined = join_by_year(climate, metrics, years);
    let y: Vec<Option<f64>> = joined.iter().map(|row| metric.value(&row.metrics)).collect();
    climate
        .index_names()
        .into_iter()
        .enumerate()
        .map(|(pos, index)| {
            let x: Vec<Option<f64>> = joined.iter().map(|row| row.climate[pos]).collect();
            Correlation {
                index: index.to_string(),
                coefficient: pearson(&x, &y),
            }
        })
        .collect()
}

/// Pearson's r over the positions where both series are present.
///
/// `None` when either series has fewer than [`MIN_CORRELATION_SAMPLES`]
/// present values, when either is constant, or when the paired values have
/// no variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    if !usable(x) || !usable(y) {
        return None;
    }
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let (dx, dy) = (a - mean_x, b - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let denominator = (var_x * var_y).sqrt();
    (denominator > 0.0).then(|| (cov / denominator).clamp(-1.0, 1.0))
}

fn usable(values: &[Option<f64>]) -> bool {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    present.len() >= MIN_CORRELATION_SAMPLES && present.iter().any(|v| *v != present[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::data::StormRecord;

    fn climate() -> ClimateTable {
        ClimateTable {
            years: vec![2000, 2001, 2002, 2003],
            series: vec![
                ("cdd".to_string(), vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
                ("cwd".to_string(), vec![Some(4.0), Some(3.0), Some(2.0), Some(1.0)]),
                ("pr".to_string(), vec![Some(5.0), Some(5.0), Some(5.0), Some(5.0)]),
                ("rx1day".to_string(), vec![Some(1.0), None, None, Some(2.0)]),
            ],
        }
    }

    fn storm(sid: &str, year: i32, wind: f64, par: IntensityClass) -> StormRecord {
        StormRecord {
            sid: sid.to_string(),
            start_year: Some(year),
            max_wind: Some(wind),
            n_track_points: Some(4),
            peak_intensity: Some(IntensityClass::classify(wind)),
            par_max_wind: Some(wind),
            par_peak_intensity: Some(par),
            any_landfall: None,
            landfall_intensity: None,
        }
    }

    fn storms() -> StormTable {
        StormTable {
            records: vec![
                storm("A", 2000, 30.0, IntensityClass::TropicalDepression),
                storm("B", 2001, 40.0, IntensityClass::TropicalStorm),
                storm("C", 2001, 70.0, IntensityClass::Typhoon),
                storm("D", 2002, 140.0, IntensityClass::SuperTyphoon),
                storm("E", 2002, 70.0, IntensityClass::Typhoon),
                storm("F", 2002, 50.0, IntensityClass::TropicalStorm),
                storm("G", 2003, 35.0, IntensityClass::TropicalStorm),
                storm("G", 2003, 35.0, IntensityClass::TropicalStorm),
                storm("H", 2003, 80.0, IntensityClass::Typhoon),
                storm("I", 2003, 90.0, IntensityClass::Typhoon),
                storm("J", 2003, 60.0, IntensityClass::TropicalStorm),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_rolling_mean() {
        let values = [Some(1.0), Some(3.0), None, Some(5.0), Some(7.0), Some(9.0)];
        let rolled = rolling_mean(&values, 5, 1);
        assert_eq!(rolled[0], Some(1.0));
        assert_eq!(rolled[1], Some(2.0));
        assert_eq!(rolled[2], Some(2.0));
        assert_eq!(rolled[4], Some(4.0));
        // Window 1..=5 holds 3, None, 5, 7, 9
        assert_eq!(rolled[5], Some(6.0));
        assert_eq!(rolling_mean(&[None, None], 5, 1), vec![None, None]);
    }

    #[test]
    fn test_baselines() {
        let climate = climate();
        let lines = baselines(&climate, &["cwd", "r50mm"], 2001..=2003, true).unwrap();
        // r50mm is absent from the table
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].years, vec![2001, 2002, 2003]);
        assert_eq!(lines[0].label, "CWD (Consecutive Wet Days)");
        assert_eq!(
            lines[0].rolling.as_deref(),
            Some(&[Some(3.0), Some(2.5), Some(2.0)][..])
        );

        let plain = baselines(&climate, &["cdd"], 1950..=2023, false).unwrap();
        assert_eq!(plain[0].rolling, None);

        assert!(matches!(
            baselines(&climate, &["tas"], 1950..=2023, true),
            Err(DashboardError::UnknownIndex(name)) if name == "tas"
        ));
    }

    #[test]
    fn test_storm_year_metrics() {
        let metrics = storm_year_metrics(&storms(), Dataset::Par);
        assert_eq!(metrics.len(), 4);

        let y2002 = &metrics[2];
        assert_eq!(y2002.year, 2002);
        assert_eq!(y2002.storm_count, 3);
        assert_eq!((y2002.ty_count, y2002.sty_count, y2002.ty_sty_count), (1, 1, 2));
        assert_eq!(y2002.ts_count, 1);
        assert_eq!(y2002.mean_max_wind, Some(260.0 / 3.0));

        // G appears twice but is one storm
        assert_eq!(metrics[3].storm_count, 4);
        assert_eq!(metrics[3].ts_count, 2);
    }

    #[test]
    fn test_landfall_metrics_drop_non_landfall_rows() {
        let mut table = storms();
        for record in table.records.iter_mut() {
            record.any_landfall = Some(record.sid != "A");
            record.landfall_intensity = record.peak_intensity;
        }
        let metrics = storm_year_metrics(&table, Dataset::Landfall);
        assert_eq!(metrics[0].year, 2001);
        assert_eq!(metrics[0].ty_count, 1);
    }

    #[test]
    fn test_pearson() {
        let up = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let down = [Some(8.0), Some(6.0), Some(4.0), Some(2.0)];
        assert!((pearson(&up, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&up, &down).unwrap() + 1.0).abs() < 1e-12);

        let constant = [Some(5.0); 4];
        assert_eq!(pearson(&up, &constant), None);

        let sparse = [Some(1.0), None, None, Some(2.0)];
        assert_eq!(pearson(&sparse, &up), None);
    }

    #[test]
    fn test_correlation_row() {
        let metrics = storm_year_metrics(&storms(), Dataset::Par);
        let row = correlation_row(&climate(), &metrics, StormMetric::StormCount, 1950..=2023);
        let names: Vec<&str> = row.iter().map(|c| c.index.as_str()).collect();
        assert_eq!(names, vec!["cdd", "cwd", "pr", "rx1day"]);

        // storm_count per year is 1, 2, 3, 4
        assert!((row[0].coefficient.unwrap() - 1.0).abs() < 1e-12);
        assert!((row[1].coefficient.unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(row[2].coefficient, None);
        assert_eq!(row[3].coefficient, None);

        let narrow = correlation_row(&climate(), &metrics, StormMetric::StormCount, 2000..=2001);
        assert!(narrow.iter().all(|c| c.coefficient.is_none()));
    }

    #[test]
    fn test_join_by_year_is_inner() {
        let metrics = vec![
            YearMetrics {
                year: 2001,
                storm_count: 2,
                ..Default::default()
            },
            YearMetrics {
                year: 2010,
                storm_count: 9,
                ..Default::default()
            },
        ];
        let joined = join_by_year(&climate(), &metrics, 1950..=2023);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].year, 2001);
        assert_eq!(joined[0].climate[1], Some(3.0));
    }
}
