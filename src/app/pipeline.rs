//! Shared "load pipeline" logic used by the report, single-query and server front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! read export -> normalize rows -> aggregate per (year, item) -> snapshot
//!
//! The front-ends can then focus on presentation (printing vs HTTP).

use std::sync::Arc;

use crate::domain::ForecastConfig;
use crate::error::LoadError;
use crate::io::ingest::load_records_from_path;
use crate::service::{Forecaster, SalesSnapshot};

/// Load the configured data file into a snapshot.
pub fn load_snapshot(config: &ForecastConfig) -> Result<SalesSnapshot, LoadError> {
    let set = load_records_from_path(&config.data_path, config.load_policy)?;
    let snapshot = SalesSnapshot::build(&set, config.week_scale);

    let report = snapshot.load_report();
    tracing::info!(
        path = %config.data_path.display(),
        rows_read = report.rows_read,
        rows_used = report.rows_used,
        items = snapshot.item_count(),
        aggregates = snapshot.aggregates().len(),
        "sales data loaded"
    );
    if report.rows_skipped() > 0 {
        tracing::warn!("{} row(s) could not be parsed and were skipped", report.rows_skipped());
    }

    Ok(snapshot)
}

/// Load the configured data file and wrap it in a forecaster.
pub fn load_forecaster(config: &ForecastConfig) -> Result<Forecaster, LoadError> {
    let snapshot = load_snapshot(config)?;
    Ok(Forecaster::new(Arc::new(snapshot), config.negative_policy))
}
