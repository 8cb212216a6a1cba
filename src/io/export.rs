//! Export predictions to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::Prediction;
use crate::error::AppError;

/// Write one CSV row per prediction to `path`.
pub fn write_predictions_csv(path: &Path, predictions: &[Prediction]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_predictions(file, predictions)
}

/// Write predictions as CSV to any writer.
pub fn write_predictions<W: Write>(out: W, predictions: &[Prediction]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);

    writer
        .write_record(["item_name", "target_year", "predicted_quantity", "method", "years_observed"])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for p in predictions {
        writer
            .write_record([
                p.item_name.clone(),
                p.target_year.to_string(),
                p.predicted_quantity.to_string(),
                p.method.label().to_string(),
                p.years_observed.to_string(),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PredictionMethod;

    #[test]
    fn writes_header_and_rows() {
        let predictions = vec![Prediction {
            item_name: "Salt, Sea".to_string(),
            target_year: 2024,
            predicted_quantity: 12,
            method: PredictionMethod::Trend,
            years_observed: 3,
        }];
        let mut buf = Vec::new();
        write_predictions(&mut buf, &predictions).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "item_name,target_year,predicted_quantity,method,years_observed\n\"Salt, Sea\",2024,12,linear trend,3\n"
        );
    }
}
