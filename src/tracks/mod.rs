pub mod aggregate;
pub mod dedup;
pub mod error;
pub mod extractor;
pub mod filtering;
pub mod loader;
pub mod pipeline;
pub mod writer;

pub use aggregate::Scopes;
pub use dedup::DuplicatePolicy;
pub use error::TrackError;
pub use loader::TrackLoader;
pub use pipeline::{CleaningConfig, CleaningOutput, CleaningReport, Retention, StormPipeline};
