pub mod error;
pub mod merge;
pub mod reshaper;

pub use error::ClimateError;
pub use merge::{merge_documents, merge_frames, ClimateMergeConfig};
pub use reshaper::ClimateDocument;
