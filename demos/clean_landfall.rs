use island_storms::constants::{
    LANDFALL_STORMS_PATH, LANDFALL_TRACKS_PATH, PH_GEOJSON_PATH, RAW_TRACKS_PATH,
};
use island_storms::{Boundary, IslandStormsError, LonConvention, StormPipeline};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), IslandStormsError> {
    pretty_env_logger::init();

    let landmass = Boundary::from_geojson_file(
        "philippines",
        Path::new(PH_GEOJSON_PATH),
        LonConvention::Signed180,
    )
    .await?;

    let output = StormPipeline::landfall(landmass)
        .run_and_write(
            Path::new(RAW_TRACKS_PATH),
            Path::new(LANDFALL_TRACKS_PATH),
            Path::new(LANDFALL_STORMS_PATH),
        )
        .await?;

    let landfalls = output
        .storms
        .iter()
        .filter(|s| s.landfall.as_ref().is_some_and(|l| l.any_landfall))
        .count();
    println!("{:#?}", output.report);
    println!(
        "Tracks rows: {} | Storms: {} | With landfall: {}",
        output.tracks.len(),
        output.storms.len(),
        landfalls
    );
    Ok(())
}
