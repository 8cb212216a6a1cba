//! Synthetic point-of-sale exports.
//!
//! Produces the same shape of file the loader expects: a short window of days
//! (July 11 onwards by default) in each of several years, one row per item per
//! day. Daily counts are Poisson around a per-item level that grows (or
//! shrinks) year over year, with a little multiplicative noise on the level.
//! Generation is fully determined by the seed.

use std::fs::File;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Normal, Poisson};

use crate::domain::TransactionRecord;
use crate::error::AppError;
use crate::io::ingest::{COL_DATE, COL_ITEM, COL_QUANTITY};

/// When a catalogue item first appears in the export.
#[derive(Debug, Clone, Copy)]
enum Launch {
    /// This many years after the first sampled year.
    After(i32),
    /// Only in the last sampled year.
    FinalYear,
}

/// Demo catalogue: `(name, mean daily units in the first year, yearly growth, launch)`.
const CATALOG: [(&str, f64, f64, Launch); 6] = [
    ("Iced Latte", 38.0, 0.12, Launch::After(0)),
    ("Espresso", 25.0, 0.03, Launch::After(0)),
    ("Blueberry Muffin", 14.0, -0.06, Launch::After(0)),
    ("Cold Brew", 9.0, 0.35, Launch::After(1)),
    ("Chai Tea", 11.0, 0.0, Launch::After(0)),
    ("Pumpkin Loaf", 6.0, 0.0, Launch::FinalYear),
];

/// Relative standard deviation of the yearly level noise.
const LEVEL_NOISE: f64 = 0.08;

/// Parameters for a synthetic export.
#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub first_year: i32,
    pub last_year: i32,
    pub window_month: u32,
    pub window_day: u32,
    pub window_days: u32,
    pub seed: u64,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            first_year: 2019,
            last_year: 2023,
            window_month: 7,
            window_day: 11,
            window_days: 4,
            seed: 42,
        }
    }
}

/// Generate transaction rows for `params`.
pub fn generate_sample(params: &SampleSpec) -> Result<Vec<TransactionRecord>, AppError> {
    if params.last_year < params.first_year {
        return Err(AppError::new(2, "Sample year range is empty (last year < first year)."));
    }
    if params.window_days == 0 {
        return Err(AppError::new(2, "Sample window must be at least one day."));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let noise = Normal::new(0.0, LEVEL_NOISE)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut records = Vec::new();
    for year in params.first_year..=params.last_year {
        let start = NaiveDate::from_ymd_opt(year, params.window_month, params.window_day).ok_or_else(|| {
            AppError::new(
                2,
                format!("Invalid sample window start {year}-{:02}-{:02}.", params.window_month, params.window_day),
            )
        })?;
        let age = year - params.first_year;

        for (name, base, growth, launch) in CATALOG {
            let introduced = match launch {
                Launch::After(years) => params.first_year.saturating_add(years),
                Launch::FinalYear => params.last_year,
            };
            if year < introduced {
                continue;
            }

            let trend = (1.0 + growth).powi(age);
            let level = (base * trend * (1.0 + noise.sample(&mut rng))).max(0.5);
            let daily = Poisson::new(level)
                .map_err(|e| AppError::new(4, format!("Count distribution error: {e}")))?;

            for day in 0..params.window_days {
                let date = start + Duration::days(i64::from(day));
                let quantity_sold = daily.sample(&mut rng) as u64;
                records.push(TransactionRecord {
                    date,
                    item_name: name.to_string(),
                    quantity_sold,
                });
            }
        }
    }

    // Exports come from a till system that writes rows as they happen, not
    // grouped by item.
    records.shuffle(&mut rng);
    records.sort_by_key(|r| r.date);
    Ok(records)
}

/// Write generated rows in the loader's input format.
pub fn write_sample_csv(path: &Path, records: &[TransactionRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sample CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record([COL_DATE, COL_ITEM, COL_QUANTITY])
        .map_err(|e| AppError::new(2, format!("Failed to write sample CSV header: {e}")))?;
    for r in records {
        writer
            .write_record([
                r.date.format("%Y-%m-%d").to_string(),
                r.item_name.clone(),
                r.quantity_sold.to_string(),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write sample CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush sample CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn same_seed_same_rows() {
        let params = SampleSpec::default();
        assert_eq!(generate_sample(&params).unwrap(), generate_sample(&params).unwrap());
    }

    #[test]
    fn rows_stay_inside_the_window() {
        let params = SampleSpec::default();
        let records = generate_sample(&params).unwrap();
        assert!(!records.is_empty());
        for r in &records {
            assert_eq!(r.date.month(), 7);
            assert!((11..15).contains(&r.date.day()), "{}", r.date);
            assert!((2019..=2023).contains(&r.date.year()));
        }
    }

    #[test]
    fn newest_item_only_appears_in_last_year() {
        let records = generate_sample(&SampleSpec::default()).unwrap();
        let years: Vec<i32> = records
            .iter()
            .filter(|r| r.item_name == "Pumpkin Loaf")
            .map(|r| r.date.year())
            .collect();
        assert_eq!(years.len(), 4);
        assert!(years.iter().all(|&y| y == 2023));
    }

    #[test]
    fn rejects_empty_year_range() {
        let params = SampleSpec {
            first_year: 2024,
            last_year: 2023,
            ..SampleSpec::default()
        };
        assert!(generate_sample(&params).is_err());
    }
}
