//! Feature table CSV reader.
use std::path::Path;

use csv::StringRecord;
use ndarray::{Array1, Array2};

use crate::config::TableSchema;
use crate::data_handling::FeatureTable;
use crate::error::{PipelineError, Result};

/// Read a comma-separated feature table with a header row.
///
/// The label, id and categorical columns are taken from `schema`; every other
/// column must hold numeric values and becomes a feature.
pub fn read_feature_table<P: AsRef<Path>>(path: P, schema: &TableSchema) -> Result<FeatureTable> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| PipelineError::csv(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::csv(path, e))?
        .clone();

    let label_idx = require_column(path, &headers, &schema.label_column)?;
    let id_indices = schema
        .id_columns
        .iter()
        .map(|c| require_column(path, &headers, c))
        .collect::<Result<Vec<_>>>()?;
    let cat_indices = schema
        .categorical_columns
        .iter()
        .map(|c| require_column(path, &headers, c))
        .collect::<Result<Vec<_>>>()?;

    let feature_indices: Vec<usize> = (0..headers.len())
        .filter(|i| *i != label_idx && !id_indices.contains(i) && !cat_indices.contains(i))
        .collect();
    let feature_names: Vec<String> = feature_indices
        .iter()
        .map(|&i| headers[i].to_string())
        .collect();

    let mut features = Vec::new();
    let mut labels = Vec::new();
    let mut ids = Vec::new();
    let mut categorical = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| PipelineError::csv(path, e))?;
        let row = row_idx + 1;

        let raw_label = field(&record, label_idx);
        labels.push(parse_label(raw_label).ok_or_else(|| PipelineError::InvalidValue {
            path: path.to_path_buf(),
            row,
            column: schema.label_column.clone(),
            value: raw_label.to_string(),
        })?);

        for &i in &feature_indices {
            let raw = field(&record, i);
            let value = raw.parse::<f32>().map_err(|_| PipelineError::InvalidValue {
                path: path.to_path_buf(),
                row,
                column: headers[i].to_string(),
                value: raw.to_string(),
            })?;
            features.push(value);
        }

        ids.push(id_indices.iter().map(|&i| field(&record, i).to_string()).collect());
        categorical.push(cat_indices.iter().map(|&i| field(&record, i).to_string()).collect());
    }

    if labels.is_empty() {
        return Err(PipelineError::EmptyTable(path.to_path_buf()));
    }

    log::debug!(
        "Read {} rows with {} numeric features from {}",
        labels.len(),
        feature_names.len(),
        path.display()
    );

    let x = Array2::from_shape_vec((labels.len(), feature_names.len()), features)?;
    FeatureTable::new(
        x,
        Array1::from_vec(labels),
        feature_names,
        schema.id_columns.clone(),
        ids,
        schema.categorical_columns.clone(),
        categorical,
    )
}

fn require_column(path: &Path, headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| PipelineError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

/// `1` is positive, `0` and `-1` are negative.
fn parse_label(raw: &str) -> Option<i32> {
    let value = raw.parse::<f32>().ok()?;
    if value == 1.0 {
        Some(1)
    } else if value == 0.0 || value == -1.0 {
        Some(-1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_reads_roles_and_normalizes_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "t.var.csv",
            "key,var_name,var_type,depth,uses,label\n\
             A.java:10,x,int,1,3,1\n\
             A.java:12,y,String,2,0,0\n\
             A.java:14,z,int,0.5,1,-1\n",
        );

        let table = read_feature_table(&path, &TableSchema::var_table()).unwrap();
        assert_eq!(table.nrows(), 3);
        assert_eq!(table.feature_names, vec!["depth", "uses"]);
        assert_eq!(table.y.to_vec(), vec![1, -1, -1]);
        assert_eq!(table.x[(2, 0)], 0.5);
        assert_eq!(table.ids[1], vec!["A.java:12".to_string(), "y".to_string()]);
        assert_eq!(table.categorical_column("var_type").unwrap(), vec!["int", "String", "int"]);
    }

    #[test]
    fn test_missing_label_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "t.csv", "key,var_name,var_type,depth\nk,x,int,1\n");
        match read_feature_table(&path, &TableSchema::var_table()) {
            Err(PipelineError::MissingColumn { column, .. }) => assert_eq!(column, "label"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_feature_names_row_and_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "t.csv",
            "key,var_name,var_type,depth,label\nk,x,int,1,1\nk,y,int,deep,0\n",
        );
        match read_feature_table(&path, &TableSchema::var_table()) {
            Err(PipelineError::InvalidValue { row, column, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "depth");
                assert_eq!(value, "deep");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_label_and_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write(&dir, "bad.csv", "key,var_name,var_type,label\nk,x,int,2\n");
        assert!(matches!(
            read_feature_table(&bad, &TableSchema::var_table()),
            Err(PipelineError::InvalidValue { .. })
        ));

        let empty = write(&dir, "empty.csv", "key,var_name,var_type,label\n");
        assert!(matches!(
            read_feature_table(&empty, &TableSchema::var_table()),
            Err(PipelineError::EmptyTable(_))
        ));
    }

    #[test]
    fn test_missing_file_is_csv_error() {
        let res = read_feature_table("/nonexistent/t.csv", &TableSchema::var_table());
        assert!(matches!(res, Err(PipelineError::Csv { .. })));
    }
}
