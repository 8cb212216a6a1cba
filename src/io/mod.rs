//! Input/output helpers.
//!
//! - sales export ingest + validation (`ingest`)
//! - prediction exports (CSV) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
