use island_storms::constants::{PAR_STORMS_PATH, PAR_TRACKS_PATH, RAW_TRACKS_PATH};
use island_storms::{IslandStormsError, StormPipeline};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), IslandStormsError> {
    pretty_env_logger::init();

    let pipeline = StormPipeline::par_entry();
    let output = pipeline
        .run_and_write(
            Path::new(RAW_TRACKS_PATH),
            Path::new(PAR_TRACKS_PATH),
            Path::new(PAR_STORMS_PATH),
        )
        .await?;

    println!("{:#?}", output.report);
    println!(
        "Tracks rows: {} | Storms: {}",
        output.tracks.len(),
        output.storms.len()
    );
    Ok(())
}
