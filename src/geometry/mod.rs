pub mod boundary;
pub mod convention;
pub mod error;

pub use boundary::{Boundary, PAR_VERTICES};
pub use convention::LonConvention;
