//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - configuration (`ForecastConfig`, `WeekScale`, `LoadPolicy`, `NegativePolicy`)
//! - normalized sales rows and per-year aggregates
//! - the case-insensitive `ItemKey` and per-item series
//! - prediction outputs

pub mod types;

pub use types::*;
