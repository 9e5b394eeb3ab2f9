//! Builds every dashboard page from the processed CSVs and opens the charts
//! in the browser.
//!
//! cargo run --example dashboard --features dashboard

use island_storms::dashboard::render;
use island_storms::{Dashboard, DataSources};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let dashboard = Dashboard::new(DataSources::default());
    for (page, result) in dashboard.pages().await {
        println!("== {} ==", page);
        match result {
            Ok(content) => render::show(&content)?,
            // One page failing leaves the others usable
            Err(e) => eprintln!("{} is unavailable: {}", page, e),
        }
    }
    Ok(())
}
