use island_storms::climate::merge;
use island_storms::{ClimateMergeConfig, IslandStormsError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), IslandStormsError> {
    pretty_env_logger::init();
    configure_polars_display();

    let config = ClimateMergeConfig::default();
    let merged = merge::run(&config).await?;

    println!("{}", merged.head(Some(5)));
    println!("Saved to {:?}", config.output_path);
    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
}
