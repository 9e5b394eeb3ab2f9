//! Reshapes nested per-country annual series into a per-year table.

use crate::climate::error::ClimateError;
use crate::constants::COL_YEAR;
use log::info;
use polars::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Period key ("YYYY" or "YYYY-MM") to value. A `null` value is kept as missing.
pub type PeriodValues = BTreeMap<String, Option<f64>>;

/// One annual climate-index document:
/// `{"data": {<series>: {<country>: {<period>: <value>}}}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClimateDocument {
    pub data: BTreeMap<String, BTreeMap<String, PeriodValues>>,
}

impl ClimateDocument {
    pub fn from_json(json: &str, origin: &Path) -> Result<Self, ClimateError> {
        serde_json::from_str(json).map_err(|e| ClimateError::JsonParse(origin.to_path_buf(), e))
    }

    pub async fn load(path: &Path) -> Result<Self, ClimateError> {
        if tokio::fs::metadata(path).await.is_err() {
            return Err(ClimateError::FileNotFound(path.to_path_buf()));
        }
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ClimateError::ReadIo(path.to_path_buf(), e))?;
        let document = Self::from_json(&contents, path)?;
        info!(
            "Loaded {} climate series from {:?}",
            document.data.len(),
            path
        );
        Ok(document)
    }

    /// Series names after `renames` are applied, in column order.
    pub fn series_names(&self, renames: &[(String, String)]) -> Vec<String> {
        self.data.keys().map(|name| rename(name, renames)).collect()
    }

    /// Builds a table with a `year` column and one column per series.
    ///
    /// Series within the document are aligned on the union of their years;
    /// a year absent from one series is missing in that column. Rows are
    /// sorted by year.
    pub fn to_annual_frame(
        &self,
        country: &str,
        renames: &[(String, String)],
    ) -> Result<DataFrame, ClimateError> {
        let mut series: Vec<(String, BTreeMap<i32, Option<f64>>)> = Vec::new();
        for (name, by_country) in &self.data {
            let periods = by_country
                .get(country)
                .ok_or_else(|| ClimateError::MissingCountry {
                    series: name.clone(),
                    country: country.to_string(),
                })?;
            series.push((rename(name, renames), annual_values(name, periods)?));
        }

        let years: BTreeSet<i32> = series
            .iter()
            .flat_map(|(_, values)| values.keys().copied())
            .collect();

        let mut columns = vec![Column::new(
            COL_YEAR.into(),
            years.iter().copied().collect::<Vec<i32>>(),
        )];
        for (name, values) in &series {
            let column: Vec<Option<f64>> = years
                .iter()
                .map(|year| values.get(year).copied().flatten())
                .collect();
            columns.push(Column::new(name.as_str().into(), column));
        }
        Ok(DataFrame::new(columns)?)
    }
}

fn rename(name: &str, renames: &[(String, String)]) -> String {
    renames
        .iter()
        .find(|(from, _)| from == name)
        .map_or_else(|| name.to_string(), |(_, to)| to.clone())
}

/// Year of a period key: its first four characters.
pub fn period_year(key: &str) -> Option<i32> {
    key.trim().get(..4)?.parse().ok()
}

fn annual_values(
    series: &str,
    periods: &PeriodValues,
) -> Result<BTreeMap<i32, Option<f64>>, ClimateError> {
    let mut values = BTreeMap::new();
    for (key, value) in periods {
        let year = period_year(key).ok_or_else(|| ClimateError::InvalidPeriodKey {
            series: series.to_string(),
            key: key.clone(),
        })?;
        if values.insert(year, *value).is_some() {
            return Err(ClimateError::DuplicateYear {
                series: series.to_string(),
                year,
            });
        }
    }
    Ok(values)
}
