//! Prediction service: the loaded data snapshot and the lookup facade.
//!
//! A [`SalesSnapshot`] is built once per load and never mutated. The
//! [`Forecaster`] answers queries against one snapshot; [`SharedSnapshot`]
//! lets a long-running server swap in a freshly loaded snapshot while
//! requests are in flight.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use rayon::prelude::*;
use serde::Serialize;

use crate::aggregate::aggregate;
use crate::domain::{
    ItemKey, ItemSeries, NegativePolicy, Prediction, PredictionMethod, SeriesPoint, WeekScale, YearItemAggregate,
};
use crate::error::ItemNotFound;
use crate::io::ingest::{RecordSet, RowError};

/// What the load that produced a snapshot saw.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

impl LoadReport {
    pub fn rows_skipped(&self) -> usize {
        self.row_errors.len()
    }
}

/// Immutable aggregates for one loaded dataset, indexed by item.
#[derive(Debug, Clone)]
pub struct SalesSnapshot {
    aggregates: Vec<YearItemAggregate>,
    index: HashMap<ItemKey, Vec<usize>>,
    week_scale: WeekScale,
    report: LoadReport,
}

impl SalesSnapshot {
    pub fn build(set: &RecordSet, week_scale: WeekScale) -> Self {
        let aggregates = aggregate(&set.records, week_scale);

        let mut index: HashMap<ItemKey, Vec<usize>> = HashMap::new();
        for (i, agg) in aggregates.iter().enumerate() {
            index.entry(ItemKey::new(&agg.item_name)).or_default().push(i);
        }

        let report = LoadReport {
            rows_read: set.rows_read,
            rows_used: set.rows_used(),
            row_errors: set.row_errors.clone(),
        };

        Self {
            aggregates,
            index,
            week_scale,
            report,
        }
    }

    /// All aggregates, sorted by `(year, item_name)`.
    pub fn aggregates(&self) -> &[YearItemAggregate] {
        &self.aggregates
    }

    pub fn week_scale(&self) -> WeekScale {
        self.week_scale
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    pub fn item_count(&self) -> usize {
        self.index.len()
    }

    /// Distinct items, sorted by their folded name.
    pub fn items(&self) -> Vec<&ItemKey> {
        let mut keys: Vec<&ItemKey> = self.index.keys().collect();
        keys.sort();
        keys
    }

    /// The per-year series for `item_name` (any casing), sorted by year.
    pub fn series(&self, item_name: &str) -> Option<ItemSeries> {
        let (key, rows) = self.index.get_key_value(&ItemKey::new(item_name))?;
        let points = rows
            .iter()
            .map(|&i| SeriesPoint {
                year: self.aggregates[i].year,
                quantity: self.aggregates[i].estimated_week_quantity,
            })
            .collect();
        Some(ItemSeries {
            key: key.clone(),
            points,
        })
    }

    /// Distinct stored item names, in order of first appearance.
    pub fn item_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.aggregates
            .iter()
            .map(|a| a.item_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// The per-year series for exactly `item_name`, without case folding.
    pub fn exact_series(&self, item_name: &str) -> ItemSeries {
        let points = self
            .aggregates
            .iter()
            .filter(|a| a.item_name == item_name)
            .map(|a| SeriesPoint {
                year: a.year,
                quantity: a.estimated_week_quantity,
            })
            .collect();
        ItemSeries {
            key: ItemKey::new(item_name),
            points,
        }
    }
}

/// Lookup facade over one snapshot.
#[derive(Debug, Clone)]
pub struct Forecaster {
    snapshot: Arc<SalesSnapshot>,
    negative_policy: NegativePolicy,
}

impl Forecaster {
    pub fn new(snapshot: Arc<SalesSnapshot>, negative_policy: NegativePolicy) -> Self {
        Self {
            snapshot,
            negative_policy,
        }
    }

    pub fn snapshot(&self) -> &SalesSnapshot {
        &self.snapshot
    }

    /// Predict the weekly quantity of `item_name` (case-insensitive) for `target_year`.
    pub fn lookup(&self, item_name: &str, target_year: i32) -> Result<Prediction, ItemNotFound> {
        self.snapshot
            .series(item_name)
            .and_then(|series| self.predict_series(&series, target_year))
            .ok_or_else(|| ItemNotFound {
                item_name: item_name.to_string(),
            })
    }

    /// One prediction per distinct exact item name in the aggregates.
    ///
    /// Names are taken as stored, in order of first appearance by
    /// `(year, item_name)`: `Widget` and `widget` are separate lines, each
    /// fitted on its own rows.
    pub fn predict_all(&self, target_year: i32) -> Vec<Prediction> {
        let series: Vec<ItemSeries> = self
            .snapshot
            .item_names()
            .into_iter()
            .map(|name| self.snapshot.exact_series(name))
            .collect();

        series
            .par_iter()
            .filter_map(|s| self.predict_series(s, target_year))
            .collect()
    }

    pub fn items(&self) -> Vec<String> {
        self.snapshot
            .items()
            .into_iter()
            .map(|k| k.display().to_string())
            .collect()
    }

    fn predict_series(&self, series: &ItemSeries, target_year: i32) -> Option<Prediction> {
        let item = series.key.display();
        let estimate = crate::fit::predict(&series.points, target_year)?;

        match (estimate.method, estimate.line) {
            (PredictionMethod::Trend, Some(line)) => {
                tracing::debug!(item, slope = line.slope, intercept = line.intercept, "fitted trend");
            }
            _ => {
                tracing::info!(item, years = estimate.years_observed, "insufficient data for a trend, carrying forward");
            }
        }

        let predicted_quantity = estimate.quantity(self.negative_policy);
        if estimate.value < 0.0 {
            tracing::warn!(
                item,
                target_year,
                value = estimate.value,
                reported = predicted_quantity,
                "trend extrapolates below zero"
            );
        }

        Some(Prediction {
            item_name: item.to_string(),
            target_year,
            predicted_quantity,
            method: estimate.method,
            years_observed: estimate.years_observed,
        })
    }
}

/// A snapshot that can be replaced atomically while readers hold the old one.
#[derive(Debug, Clone)]
pub struct SharedSnapshot {
    inner: Arc<RwLock<Arc<SalesSnapshot>>>,
}

impl SharedSnapshot {
    pub fn new(snapshot: SalesSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// The snapshot currently being served.
    pub fn current(&self) -> Arc<SalesSnapshot> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Swap in `snapshot`, returning the one it replaced.
    pub fn replace(&self, snapshot: SalesSnapshot) -> Arc<SalesSnapshot> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(snapshot))
    }
}
