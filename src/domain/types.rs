//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built once per load and shared read-only between requests
//! - rendered by the console report and the HTTP front-end
//! - exported to CSV

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Target year used when none is configured.
pub const DEFAULT_TARGET_YEAR: i32 = 2024;

/// Rescaling from the observed sales window to a full week.
///
/// Each year's data covers a fixed window of `observed_days` days; aggregates
/// are multiplied by `week_days / observed_days`. The window length is a known
/// property of the export, never measured from the dates in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekScale {
    pub observed_days: u32,
    pub week_days: u32,
}

impl WeekScale {
    pub fn new(observed_days: u32) -> Option<Self> {
        if observed_days == 0 {
            return None;
        }
        Some(Self {
            observed_days,
            week_days: 7,
        })
    }

    /// Multiplier applied to a raw window sum.
    pub fn factor(self) -> f64 {
        f64::from(self.week_days) / f64::from(self.observed_days)
    }
}

impl Default for WeekScale {
    /// Four observed days scaled to a seven-day week (`× 1.75`).
    fn default() -> Self {
        Self {
            observed_days: 4,
            week_days: 7,
        }
    }
}

/// What to do with a row whose date, item name or quantity can't be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Skip the row, keep loading, and report it.
    #[default]
    Lenient,
    /// Abort the whole load on the first bad row.
    Strict,
}

/// How a negative trend extrapolation is reported.
///
/// A falling trend evaluated far enough ahead goes below zero. Sales can't be
/// negative, but clamping hides the fact that the trend is unusable there, so
/// the raw value is kept unless asked otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NegativePolicy {
    /// Return the fitted value as is (a warning is logged).
    #[default]
    Allow,
    /// Clamp predictions to zero.
    ClampZero,
}

/// Engine configuration as understood by the pipeline.
///
/// This is derived from CLI flags / environment (plus defaults).
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub data_path: PathBuf,
    pub target_year: i32,
    pub week_scale: WeekScale,
    pub load_policy: LoadPolicy,
    pub negative_policy: NegativePolicy,
}

impl ForecastConfig {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            target_year: DEFAULT_TARGET_YEAR,
            week_scale: WeekScale::default(),
            load_policy: LoadPolicy::default(),
            negative_policy: NegativePolicy::default(),
        }
    }
}

/// Case-insensitive item identity.
///
/// The name is folded once on construction; equality, hashing and ordering
/// only look at the folded form. The display form keeps the casing it was
/// first seen with.
#[derive(Debug, Clone, Serialize)]
pub struct ItemKey {
    #[serde(skip)]
    folded: String,
    display: String,
}

impl ItemKey {
    pub fn new(name: &str) -> Self {
        Self {
            folded: fold(name),
            display: name.to_string(),
        }
    }

    pub fn folded(&self) -> &str {
        &self.folded
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// True if `name` refers to this item.
    pub fn matches(&self, name: &str) -> bool {
        self.folded == fold(name)
    }
}

/// Canonical case fold used for every item comparison.
pub fn fold(name: &str) -> String {
    name.to_lowercase()
}

impl PartialEq for ItemKey {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for ItemKey {}

impl Hash for ItemKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl PartialOrd for ItemKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

/// One normalized point-of-sale row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub item_name: String,
    pub quantity_sold: u64,
}

/// Sales of one item (exact name) in one year, scaled to a week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearItemAggregate {
    pub year: i32,
    pub item_name: String,
    pub raw_quantity_sum: u64,
    pub estimated_week_quantity: f64,
}

/// A single `(year, weekly quantity)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub quantity: f64,
}

/// All observations for one item, sorted by year.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSeries {
    pub key: ItemKey,
    pub points: Vec<SeriesPoint>,
}

/// How a prediction was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PredictionMethod {
    /// Least-squares line through two or more years.
    Trend,
    /// Only one year of data: its value is carried forward.
    CarryForward,
}

impl PredictionMethod {
    pub fn label(self) -> &'static str {
        match self {
            PredictionMethod::Trend => "linear trend",
            PredictionMethod::CarryForward => "carry-forward (single year)",
        }
    }
}

/// A weekly quantity prediction for one item and year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub item_name: String,
    pub target_year: i32,
    pub predicted_quantity: i64,
    pub method: PredictionMethod,
    pub years_observed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_week_scale_is_seven_quarters() {
        assert_eq!(WeekScale::default().factor(), 1.75);
        assert_eq!(WeekScale::new(7).unwrap().factor(), 1.0);
        assert!(WeekScale::new(0).is_none());
    }

    #[test]
    fn item_key_ignores_case() {
        let a = ItemKey::new("Widget");
        let b = ItemKey::new("WIDGET");
        assert_eq!(a, b);
        assert_eq!(a.display(), "Widget");
        assert_eq!(b.display(), "WIDGET");
        assert!(a.matches("widget"));
        assert!(!a.matches("widgets"));
    }

    #[test]
    fn item_key_folds_non_ascii() {
        assert_eq!(ItemKey::new("CRÈME"), ItemKey::new("crème"));
    }
}
