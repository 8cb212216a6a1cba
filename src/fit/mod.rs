//! Per-item trend estimation.

pub mod trend;

pub use trend::*;
