//! Opens dashboard pages as interactive charts in the browser.

use crate::dashboard::frames;
use crate::dashboard::{ClimateDriversPage, ExplorerView, OverviewPage, PageContent};
use log::info;
use plotlars::{BarPlot, HeatMap, Plot, ScatterPlot, Text, TimeSeriesPlot};
use polars::prelude::*;

pub fn show_overview(page: &OverviewPage) -> PolarsResult<()> {
    let classes = frames::class_counts_frame(&page.kpis)?;
    let title = format!(
        "Exposure vs impact: {} PAR storms, {} landfalls ({:.1}%)",
        page.kpis.par_total, page.kpis.land_total, page.kpis.conversion_rate
    );
    BarPlot::builder()
        .data(&classes)
        .labels("intensity")
        .values("count")
        .group("dataset")
        .plot_title(Text::from(title.as_str()))
        .x_title("Intensity class")
        .y_title("Storms")
        .build()
        .plot();

    let frequency = frames::frequency_frame(&page.frequency)?;
    if frequency.height() > 0 {
        TimeSeriesPlot::builder()
            .data(&frequency)
            .x(frames::COL_YEAR_LABEL)
            .y("TD")
            .additional_series(vec!["TS", "TY", "STY"])
            .plot_title(Text::from("Annual frequency by intensity class"))
            .x_title("Year")
            .y_title("Storm count")
            .build()
            .plot();
    }
    Ok(())
}

pub fn show_climate_drivers(page: &ClimateDriversPage) -> PolarsResult<()> {
    for baseline in &page.baselines {
        let df = frames::baseline_frame(baseline)?;
        let smoothed: Vec<&str> = if baseline.rolling.is_some() {
            vec![frames::COL_ROLLING_MEAN]
        } else {
            vec![]
        };
        let title = format!("{} over time", baseline.label);
        TimeSeriesPlot::builder()
            .data(&df)
            .x(frames::COL_YEAR_LABEL)
            .y(frames::COL_VALUE)
            .additional_series(smoothed)
            .plot_title(Text::from(title.as_str()))
            .x_title("Year")
            .y_title(baseline.label.as_str())
            .build()
            .plot();
    }

    let correlations = frames::correlation_frame(page.metric, &page.correlations)?;
    let title = format!("Pearson correlation: climate drivers vs {}", page.metric);
    HeatMap::builder()
        .data(&correlations)
        .x("index")
        .y("metric")
        .z("coefficient")
        .plot_title(Text::from(title.as_str()))
        .build()
        .plot();
    Ok(())
}

pub fn show_explorer(view: &ExplorerView) -> PolarsResult<()> {
    let df = frames::paths_frame(&view.paths)?;
    let title = format!(
        "Landfall tracks: {} storms, {} drawn",
        view.storm_count,
        view.paths.len()
    );
    ScatterPlot::builder()
        .data(&df)
        .x("lon")
        .y("lat")
        .group("peak_intensity")
        .plot_title(Text::from(title.as_str()))
        .x_title("Longitude")
        .y_title("Latitude")
        .build()
        .plot();
    Ok(())
}

pub fn show(content: &PageContent) -> PolarsResult<()> {
    match content {
        PageContent::Overview(page) => show_overview(page)?,
        PageContent::ClimateDrivers(page) => show_climate_drivers(page)?,
        PageContent::Explorer(view) => show_explorer(view)?,
    }
    info!("Opened charts in the browser");
    Ok(())
}
