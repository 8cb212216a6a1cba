//! Sales export ingest and normalization.
//!
//! This module is responsible for turning a point-of-sale export into a clean
//! set of `(date, item, quantity)` records that are safe to aggregate.
//!
//! Design goals:
//! - **Strict schema** for the three required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no aggregation here
//!
//! Exports in the wild mix commas and tabs, sometimes on the same line, and
//! pad header names with spaces. Every run of commas/tabs outside quotes is
//! treated as a single field boundary, and header names are matched after
//! trimming.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use serde::Serialize;

use crate::domain::{LoadPolicy, TransactionRecord};
use crate::error::LoadError;

pub const COL_DATE: &str = "Date";
pub const COL_ITEM: &str = "Item Name";
pub const COL_QUANTITY: &str = "Quantity Sold";

const REQUIRED_COLUMNS: [&str; 3] = [COL_DATE, COL_ITEM, COL_QUANTITY];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based line number in the input (the header is line 1).
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized records + what was skipped.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub records: Vec<TransactionRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl RecordSet {
    /// Wrap records that already carry typed dates. Nothing is re-parsed.
    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        Self {
            rows_read: records.len(),
            records,
            row_errors: Vec::new(),
        }
    }

    pub fn rows_used(&self) -> usize {
        self.records.len()
    }

    pub fn rows_skipped(&self) -> usize {
        self.row_errors.len()
    }
}

/// Load and normalize a sales export from disk.
pub fn load_records_from_path(path: &Path, policy: LoadPolicy) -> Result<RecordSet, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: Some(path.to_path_buf()),
        source,
    })?;
    load_records(file, policy).map_err(|err| match err {
        LoadError::Io { path: None, source } => LoadError::Io {
            path: Some(path.to_path_buf()),
            source,
        },
        other => other,
    })
}

/// Load and normalize a sales export from any reader.
pub fn load_records<R: Read>(mut input: R, policy: LoadPolicy) -> Result<RecordSet, LoadError> {
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .map_err(|source| LoadError::Io { path: None, source })?;
    let text = normalize_separators(&raw);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LoadError::Header(e.to_string()))?
        .clone();
    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut set = RecordSet::default();

    for (idx, result) in reader.records().enumerate() {
        set.rows_read += 1;

        let (line, parsed) = match result {
            Ok(record) => {
                // Blank lines are skipped by the reader, so take the line from
                // the record itself when it is available.
                let line = record.position().map_or(idx + 2, |p| p.line() as usize);
                (line, parse_row(&record, &header_map))
            }
            Err(e) => (idx + 2, Err(format!("Malformed row: {e}"))),
        };

        match parsed {
            Ok(record) => set.records.push(record),
            Err(message) => {
                let row_error = RowError { line, message };
                if policy == LoadPolicy::Strict {
                    return Err(LoadError::RecordParse(row_error));
                }
                tracing::warn!(line = row_error.line, "skipping row: {}", row_error.message);
                set.row_errors.push(row_error);
            }
        }
    }

    if set.records.is_empty() {
        return Err(LoadError::NoValidRows {
            rows_read: set.rows_read,
        });
    }

    Ok(set)
}

/// Collapse every run of commas/tabs into one tab, line by line.
///
/// A field that opens with `"` may contain separators up to its closing
/// quote (`""` inside is a literal quote). A quote anywhere else is plain
/// text, and a line whose quoted field never closes is split ignoring quotes,
/// so no field ever spans lines. Leading and trailing separator runs are
/// dropped, so a line made only of separators becomes blank.
fn normalize_separators(raw: &str) -> String {
    let raw = raw.trim_start_matches('\u{feff}');
    let mut out = String::with_capacity(raw.len());

    for line in raw.lines() {
        match split_line(line, true) {
            Some(fields) => out.push_str(&fields),
            None => out.push_str(&split_line(line, false).unwrap_or_default()),
        }
        out.push('\n');
    }

    out
}

/// Returns `None` if `honor_quotes` is set and a quoted field is left open.
fn split_line(line: &str, honor_quotes: bool) -> Option<String> {
    let mut out = String::with_capacity(line.len());
    let mut in_quotes = false;
    let mut just_closed = false;
    let mut at_field_start = true;
    let mut pending_sep = false;
    let mut line_has_field = false;

    for ch in line.chars() {
        if honor_quotes && ch == '"' {
            if in_quotes {
                in_quotes = false;
                just_closed = true;
            } else if at_field_start || just_closed {
                in_quotes = true;
                just_closed = false;
            }
        } else {
            just_closed = false;
        }

        if !in_quotes && (ch == ',' || ch == '\t') {
            pending_sep = true;
            at_field_start = true;
            continue;
        }
        if pending_sep && line_has_field {
            out.push('\t');
        }
        pending_sep = false;
        line_has_field = true;
        if !ch.is_whitespace() {
            at_field_start = false;
        }
        // The reader splits on tabs only.
        out.push(if ch == '\t' { ' ' } else { ch });
    }

    if in_quotes { None } else { Some(out) }
}

/// Strip one surrounding pair of double quotes and unescape `""`.
fn unquote(field: &str) -> String {
    let field = field.trim();
    match field.strip_prefix('"').and_then(|f| f.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => field.to_string(),
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (unquote(name), idx))
        .collect()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), LoadError> {
    let missing: Vec<&'static str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|col| !header_map.contains_key(*col))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::Schema { missing })
    }
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<TransactionRecord, String> {
    let date = parse_date(&unquote(get_required(record, header_map, COL_DATE)?))?;
    let item_name = unquote(get_required(record, header_map, COL_ITEM)?);
    if item_name.is_empty() {
        return Err(format!("Missing required value: `{COL_ITEM}`"));
    }
    let quantity_sold = parse_quantity(&unquote(get_required(record, header_map, COL_QUANTITY)?))?;

    Ok(TransactionRecord {
        date,
        item_name,
        quantity_sold,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // Slash dates are read month-first, the way US point-of-sale exports
    // write them. Two-digit years come before four-digit ones: `%Y` would
    // happily read `23` as the year 23.
    const DATE_FMTS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%Y/%m/%d", "%b %d, %Y"];
    const DATETIME_FMTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, MM/DD/YYYY, MM/DD/YY, Mon DD, YYYY (optionally with a time)."
    ))
}

fn parse_quantity(s: &str) -> Result<u64, String> {
    if let Ok(q) = s.parse::<u64>() {
        return Ok(q);
    }
    match s.parse::<f64>() {
        // Spreadsheet exports often write whole numbers as `12.0`.
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64 => Ok(v as u64),
        Ok(_) => Err(format!("Invalid quantity '{s}': must be a non-negative whole number.")),
        Err(_) => Err(format!("Invalid quantity '{s}'.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn loads_comma_separated_with_padded_headers() {
        let input = " Date , Item Name ,Quantity Sold \n2023-07-11,Widget,5\n2023-07-12,Gadget,3\n";
        let set = load_records(input.as_bytes(), LoadPolicy::Lenient).unwrap();
        assert_eq!(set.rows_read, 2);
        assert_eq!(set.rows_used(), 2);
        assert_eq!(
            set.records[0],
            TransactionRecord {
                date: date(2023, 7, 11),
                item_name: "Widget".to_string(),
                quantity_sold: 5,
            }
        );
    }

    #[test]
    fn tolerates_mixed_separators() {
        let input = "Date,\tItem Name\tQuantity Sold\n2022-07-11\t,Iced Latte,,4\n2022-07-12,Iced Latte\t6,\n";
        let set = load_records(input.as_bytes(), LoadPolicy::Strict).unwrap();
        assert_eq!(set.rows_used(), 2);
        assert_eq!(set.records[0].item_name, "Iced Latte");
        assert_eq!(set.records[0].quantity_sold, 4);
        assert_eq!(set.records[1].quantity_sold, 6);
    }

    #[test]
    fn quoted_names_keep_commas() {
        let input = "Date,Item Name,Quantity Sold\n2022-07-11,\"Salt, Sea\",2\n";
        let set = load_records(input.as_bytes(), LoadPolicy::Strict).unwrap();
        assert_eq!(set.records[0].item_name, "Salt, Sea");
    }

    #[test]
    fn quoted_header_and_escaped_quotes() {
        let input = "\"Date\",\"Item Name\",\"Quantity Sold\"\n2022-07-11,\"The \"\"Big\"\" One\",\"3\"\n";
        let set = load_records(input.as_bytes(), LoadPolicy::Strict).unwrap();
        assert_eq!(set.records[0].item_name, "The \"Big\" One");
        assert_eq!(set.records[0].quantity_sold, 3);
    }

    #[test]
    fn inch_mark_inside_a_name_is_plain_text() {
        let input = "Date,Item Name,Quantity Sold\n2023-07-11,12\" Pizza,5\n2023-07-11,Widget,2\n";
        let set = load_records(input.as_bytes(), LoadPolicy::Strict).unwrap();
        assert_eq!(set.rows_used(), 2);
        assert_eq!(set.records[0].item_name, "12\" Pizza");
        assert_eq!(set.records[0].quantity_sold, 5);
    }

    #[test]
    fn unclosed_quote_stays_on_its_line() {
        let input = "Date,Item Name,Quantity Sold\n\
                     2023-07-11,\"Widget,5\n\
                     2023-07-12,Widget,4\n\
                     2023-07-13,Widget,6\n\
                     2023-07-13,Gadget,1\n";
        let set = load_records(input.as_bytes(), LoadPolicy::Lenient).unwrap();
        assert_eq!(set.rows_read, 4);
        assert_eq!(set.rows_skipped(), 0);
        assert_eq!(set.records[0].item_name, "\"Widget");
        assert_eq!(set.records[0].quantity_sold, 5);

        let rest: Vec<(&str, u64)> = set.records[1..]
            .iter()
            .map(|r| (r.item_name.as_str(), r.quantity_sold))
            .collect();
        assert_eq!(rest, vec![("Widget", 4), ("Widget", 6), ("Gadget", 1)]);
    }

    #[test]
    fn missing_columns_are_a_schema_error() {
        let input = "Date,Item,Quantity Sold\n2023-07-11,Widget,5\n";
        match load_records(input.as_bytes(), LoadPolicy::Lenient) {
            Err(LoadError::Schema { missing }) => assert_eq!(missing, vec![COL_ITEM]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn lenient_policy_skips_bad_rows() {
        let input = "Date,Item Name,Quantity Sold\n\
                     2023-07-11,Widget,5\n\
                     not-a-date,Widget,7\n\
                     2023-07-12,Widget,-1\n\
                     2023-07-13,Widget,2\n";
        let set = load_records(input.as_bytes(), LoadPolicy::Lenient).unwrap();
        assert_eq!(set.rows_read, 4);
        assert_eq!(set.rows_used(), 2);
        assert_eq!(set.rows_skipped(), 2);
        assert_eq!(set.row_errors[0].line, 3);
        assert!(set.row_errors[0].message.contains("Invalid date"));
        assert_eq!(set.row_errors[1].line, 4);
    }

    #[test]
    fn strict_policy_aborts_on_bad_row() {
        let input = "Date,Item Name,Quantity Sold\n2023-07-11,Widget,5\n2023-07-12,Widget,lots\n";
        match load_records(input.as_bytes(), LoadPolicy::Strict) {
            Err(LoadError::RecordParse(row)) => assert_eq!(row.line, 3),
            other => panic!("expected record parse error, got {other:?}"),
        }
    }

    #[test]
    fn all_rows_invalid_is_fatal() {
        let input = "Date,Item Name,Quantity Sold\nbad,Widget,5\n";
        assert!(matches!(
            load_records(input.as_bytes(), LoadPolicy::Lenient),
            Err(LoadError::NoValidRows { rows_read: 1 })
        ));
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("2023-07-11").unwrap(), date(2023, 7, 11));
        assert_eq!(parse_date("2023/07/11").unwrap(), date(2023, 7, 11));
        assert_eq!(parse_date("07/11/2023").unwrap(), date(2023, 7, 11));
        assert_eq!(parse_date("2023-07-11 00:00:00").unwrap(), date(2023, 7, 11));
        assert_eq!(parse_date("2023-07-11T08:30:00").unwrap(), date(2023, 7, 11));
        assert_eq!(parse_date("2023-07-11T08:30:00+02:00").unwrap(), date(2023, 7, 11));
        assert_eq!(parse_date("2023-07-11 08:30").unwrap(), date(2023, 7, 11));
        assert_eq!(parse_date("7/11/23").unwrap(), date(2023, 7, 11));
        assert_eq!(parse_date("7/11/2023").unwrap(), date(2023, 7, 11));
        assert_eq!(parse_date("Jul 11, 2023").unwrap(), date(2023, 7, 11));
        assert!(parse_date("11.07.2023").is_err());
    }

    #[test]
    fn quantity_accepts_whole_floats_only() {
        assert_eq!(parse_quantity("12").unwrap(), 12);
        assert_eq!(parse_quantity("12.0").unwrap(), 12);
        assert!(parse_quantity("12.5").is_err());
        assert!(parse_quantity("-3").is_err());
        assert!(parse_quantity("NaN").is_err());
    }

    #[test]
    fn from_records_skips_parsing() {
        let records = vec![TransactionRecord {
            date: date(2021, 7, 11),
            item_name: "Widget".to_string(),
            quantity_sold: 1,
        }];
        let set = RecordSet::from_records(records.clone());
        assert_eq!(set.records, records);
        assert_eq!(set.rows_read, 1);
        assert_eq!(set.rows_skipped(), 0);
    }
}
