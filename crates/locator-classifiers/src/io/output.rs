//! Writers for stage artifacts under `model/` and `output/`.
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::data_handling::FeatureTable;
use crate::error::{PipelineError, Result};

/// Create `dir` and its parents if missing.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))
}

/// Pretty-print `value` as JSON into `path`, creating the parent directory.
pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| PipelineError::io(path, e))
}

/// Write one line per row: the id columns, the label and the predicted probability.
pub fn write_predictions_tsv<P: AsRef<Path>>(
    path: P,
    table: &FeatureTable,
    probabilities: &[f32],
) -> Result<()> {
    let path = path.as_ref();
    if probabilities.len() != table.nrows() {
        return Err(PipelineError::Shape(format!(
            "{} predictions for {} rows",
            probabilities.len(),
            table.nrows()
        )));
    }
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| PipelineError::csv(path, e))?;

    let mut header: Vec<&str> = table.id_columns.iter().map(String::as_str).collect();
    header.push("label");
    header.push("probability");
    writer
        .write_record(&header)
        .map_err(|e| PipelineError::csv(path, e))?;

    for (row, prob) in probabilities.iter().enumerate() {
        let mut record: Vec<String> = table.ids[row].clone();
        record.push(table.y[row].to_string());
        record.push(format!("{:.6}", prob));
        writer
            .write_record(&record)
            .map_err(|e| PipelineError::csv(path, e))?;
    }

    writer.flush().map_err(|e| PipelineError::io(path, e))
}
