//! Per-year, per-item aggregation.
//!
//! Each export covers the same short window every year. Rows are summed per
//! `(calendar year, exact item name)` and the sum is rescaled to a full week
//! with the configured [`WeekScale`]. Grouping is on the literal stored name;
//! case-insensitive matching happens later, at lookup time.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::domain::{TransactionRecord, WeekScale, YearItemAggregate};

/// Aggregate records into one row per `(year, item_name)`.
///
/// The output is sorted by year, then item name, so the result does not
/// depend on the order of `records`. A sum that would overflow `u64` is
/// pinned at `u64::MAX` and a warning is logged for that group.
pub fn aggregate(records: &[TransactionRecord], scale: WeekScale) -> Vec<YearItemAggregate> {
    let mut sums: BTreeMap<(i32, &str), u64> = BTreeMap::new();
    for r in records {
        let key = (r.date.year(), r.item_name.as_str());
        let sum = sums.entry(key).or_insert(0);
        *sum = match sum.checked_add(r.quantity_sold) {
            Some(total) => total,
            None => {
                tracing::warn!(year = key.0, item = key.1, "quantity sum overflows, pinned at u64::MAX");
                u64::MAX
            }
        };
    }

    let factor = scale.factor();
    sums.into_iter()
        .map(|((year, item_name), raw_quantity_sum)| YearItemAggregate {
            year,
            item_name: item_name.to_string(),
            raw_quantity_sum,
            estimated_week_quantity: raw_quantity_sum as f64 * factor,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(y: i32, d: u32, item: &str, q: u64) -> TransactionRecord {
        TransactionRecord {
            date: NaiveDate::from_ymd_opt(y, 7, d).unwrap(),
            item_name: item.to_string(),
            quantity_sold: q,
        }
    }

    #[test]
    fn sums_per_year_and_item_then_scales() {
        let records = vec![
            rec(2022, 11, "Widget", 10),
            rec(2022, 12, "Widget", 6),
            rec(2022, 11, "Gadget", 4),
            rec(2023, 13, "Widget", 20),
        ];
        let aggs = aggregate(&records, WeekScale::default());
        assert_eq!(aggs.len(), 3);

        assert_eq!(aggs[0].year, 2022);
        assert_eq!(aggs[0].item_name, "Gadget");
        assert_eq!(aggs[0].raw_quantity_sum, 4);
        assert_eq!(aggs[0].estimated_week_quantity, 7.0);

        assert_eq!(aggs[1].item_name, "Widget");
        assert_eq!(aggs[1].raw_quantity_sum, 16);
        assert_eq!(aggs[1].estimated_week_quantity, 28.0);

        assert_eq!(aggs[2].year, 2023);
        assert_eq!(aggs[2].raw_quantity_sum, 20);
    }

    #[test]
    fn groups_on_exact_name() {
        let records = vec![rec(2022, 11, "Widget", 1), rec(2022, 12, "widget", 2)];
        let aggs = aggregate(&records, WeekScale::default());
        assert_eq!(aggs.len(), 2);
    }

    #[test]
    fn scale_is_configuration() {
        let records = vec![rec(2022, 11, "Widget", 10)];
        let scale = WeekScale::new(5).unwrap();
        let aggs = aggregate(&records, scale);
        assert!((aggs[0].estimated_week_quantity - 14.0).abs() < 1e-12);
    }

    #[test]
    fn overflowing_sum_is_pinned() {
        let records = vec![rec(2022, 11, "Widget", u64::MAX - 1), rec(2022, 12, "Widget", 5)];
        let aggs = aggregate(&records, WeekScale::default());
        assert_eq!(aggs[0].raw_quantity_sum, u64::MAX);
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut records = vec![
            rec(2021, 11, "B", 3),
            rec(2022, 11, "A", 5),
            rec(2021, 12, "A", 1),
            rec(2022, 14, "B", 9),
        ];
        let forward = aggregate(&records, WeekScale::default());
        records.reverse();
        let backward = aggregate(&records, WeekScale::default());
        assert_eq!(forward, backward);
    }
}
