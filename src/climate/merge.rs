//! Inner-joins several annual climate tables on year.

use crate::climate::error::ClimateError;
use crate::climate::reshaper::ClimateDocument;
use crate::constants::{
    COL_YEAR, ERA5_COLUMN_ORDER, ERA5_COUNTRY_CODE, ERA5_JSON_FILES, ERA5_OUTPUT_CSV_PATH,
    RAW_ERA5_DIR,
};
use crate::output::write_csv;
use crate::utils::column_names;
use bon::Builder;
use log::info;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;

fn strings<const N: usize>(values: [&str; N]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Where the ERA5 documents live, how to reshape them and where the merged
/// table goes. Defaults reproduce the processed `merged_era5_data.csv`.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ClimateMergeConfig {
    #[builder(into, default = PathBuf::from(RAW_ERA5_DIR))]
    pub input_dir: PathBuf,
    /// Document file names, relative to `input_dir`.
    #[builder(default = strings(ERA5_JSON_FILES))]
    pub files: Vec<String>,
    #[builder(into, default = ERA5_COUNTRY_CODE.to_string())]
    pub country: String,
    /// Columns of the merged table, in order. Must include `year`.
    #[builder(default = strings(ERA5_COLUMN_ORDER))]
    pub column_order: Vec<String>,
    /// Series renames applied while reshaping, as `(from, to)`.
    #[builder(default = vec![("prpercnt".to_string(), "prpercent".to_string())])]
    pub renames: Vec<(String, String)>,
    #[builder(into, default = PathBuf::from(ERA5_OUTPUT_CSV_PATH))]
    pub output_path: PathBuf,
}

impl Default for ClimateMergeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Inner-joins `frames` on `year`, sorts by year and selects `column_order`.
///
/// # Errors
///
/// * [`ClimateError::NoDocuments`] when `frames` is empty.
/// * [`ClimateError::DuplicateSeries`] when two frames share a series column.
/// * [`ClimateError::MissingColumns`] when an ordered column is absent after
///   the join. Extra columns are dropped; missing ones are never skipped.
pub fn merge_frames(
    frames: Vec<DataFrame>,
    column_order: &[String],
) -> Result<DataFrame, ClimateError> {
    let mut seen: HashSet<String> = HashSet::new();
    for frame in &frames {
        for name in column_names(frame) {
            if name != COL_YEAR && !seen.insert(name.clone()) {
                return Err(ClimateError::DuplicateSeries(name));
            }
        }
    }

    let mut frames = frames.into_iter();
    let first = frames.next().ok_or(ClimateError::NoDocuments)?;
    let joined = frames
        .fold(first.lazy(), |merged, frame| {
            merged.join(
                frame.lazy(),
                [col(COL_YEAR)],
                [col(COL_YEAR)],
                JoinArgs::new(JoinType::Inner),
            )
        })
        .sort([COL_YEAR], SortMultipleOptions::default())
        .collect()?;

    let available = column_names(&joined);
    let missing: Vec<String> = column_order
        .iter()
        .filter(|name| !available.contains(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ClimateError::MissingColumns(missing));
    }

    Ok(joined.select(column_order.iter().map(String::as_str))?)
}

/// Loads and reshapes every configured document, then merges them.
pub async fn merge_documents(config: &ClimateMergeConfig) -> Result<DataFrame, ClimateError> {
    let mut frames = Vec::with_capacity(config.files.len());
    for file in &config.files {
        let document = ClimateDocument::load(&config.input_dir.join(file)).await?;
        frames.push(document.to_annual_frame(&config.country, &config.renames)?);
    }
    let merged = merge_frames(frames, &config.column_order)?;
    info!(
        "Merged {} climate documents into {} years x {} columns",
        config.files.len(),
        merged.height(),
        merged.width()
    );
    Ok(merged)
}

/// Merges the configured documents and writes the table to `output_path`.
pub async fn run(config: &ClimateMergeConfig) -> Result<DataFrame, ClimateError> {
    let merged = merge_documents(config).await?;
    write_csv(merged.clone(), &config.output_path).await?;
    info!("Saved merged climate CSV to {:?}", config.output_path);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn document(series: &[&str], years: std::ops::RangeInclusive<i32>) -> String {
        let body: Vec<String> = series
            .iter()
            .map(|name| {
                let values: Vec<String> = years
                    .clone()
                    .map(|year| format!(r#""{year}-07": {}.5"#, year - 1990))
                    .collect();
                format!(r#""{name}": {{"PHL": {{{}}}}}"#, values.join(", "))
            })
            .collect();
        format!(r#"{{"data": {{{}}}}}"#, body.join(", "))
    }

    async fn write_documents(dir: &Path) -> Vec<String> {
        let docs = [
            ("a.json", document(&["cdd", "r50mm", "r95ptot"], 2000..=2002)),
            ("b.json", document(&["cwd", "rx1day", "rx5day"], 2001..=2003)),
            ("c.json", document(&["pr", "prpercnt", "r20mm"], 2000..=2003)),
        ];
        for (name, body) in &docs {
            tokio::fs::write(dir.join(name), body).await.unwrap();
        }
        docs.iter().map(|(name, _)| name.to_string()).collect()
    }

    #[tokio::test]
    async fn test_inner_join_keeps_common_years_in_declared_order() -> Result<(), ClimateError> {
        let dir = tempfile::tempdir().unwrap();
        let files = write_documents(dir.path()).await;
        let config = ClimateMergeConfig::builder()
            .input_dir(dir.path())
            .files(files)
            .output_path(dir.path().join("out/merged.csv"))
            .build();

        let merged = run(&config).await?;
        assert_eq!(column_names(&merged), strings(ERA5_COLUMN_ORDER));
        let years: Vec<Option<i32>> = merged.column("year")?.i32()?.into_iter().collect();
        assert_eq!(years, vec![Some(2001), Some(2002)]);
        assert_eq!(merged.column("cwd")?.f64()?.get(0), Some(11.5));

        let written = tokio::fs::read_to_string(&config.output_path).await.unwrap();
        assert!(written.starts_with("year,cdd,r50mm,r95ptot,cwd,rx1day,rx5day,pr,prpercent,r20mm\n"));
        assert_eq!(written.lines().count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_ordered_column_raises() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_documents(dir.path()).await;
        let config = ClimateMergeConfig::builder()
            .input_dir(dir.path())
            .files(files)
            .renames(vec![])
            .build();

        match merge_documents(&config).await {
            Err(ClimateError::MissingColumns(missing)) => {
                assert_eq!(missing, vec!["prpercent".to_string()])
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClimateMergeConfig::builder()
            .input_dir(dir.path())
            .files(vec!["absent.json".to_string()])
            .build();
        assert!(matches!(
            merge_documents(&config).await,
            Err(ClimateError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_series_across_documents() {
        let a = df!("year" => [2000], "pr" => [1.0]).unwrap();
        let b = df!("year" => [2000], "pr" => [2.0]).unwrap();
        assert!(matches!(
            merge_frames(vec![a, b], &["year".to_string()]),
            Err(ClimateError::DuplicateSeries(name)) if name == "pr"
        ));
        assert!(matches!(
            merge_frames(vec![], &[]),
            Err(ClimateError::NoDocuments)
        ));
    }

    #[test]
    fn test_default_config() {
        let config = ClimateMergeConfig::default();
        assert_eq!(config.country, "PHL");
        assert_eq!(config.files.len(), 3);
        assert_eq!(config.column_order[8], "prpercent");
        assert_eq!(config.output_path, PathBuf::from(ERA5_OUTPUT_CSV_PATH));
    }
}
