pub mod intensity;
pub mod storm;
pub mod track;
