//! Console reporting for loads and predictions.

pub mod format;

pub use format::*;
