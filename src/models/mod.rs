//! Core data models: tournament records and derived statistics.

mod ids;
mod stats;
mod tournament;

pub use ids::*;
pub use stats::*;
pub use tournament::*;
