use std::collections::BTreeMap;

use ndarray::{concatenate, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data_handling::FeatureTable;
use crate::error::{PipelineError, Result};

/// Token-to-cluster mapping for one categorical column.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ColumnEncoding {
    pub column: String,
    /// Number of clusters seen during fitting. Ids run from 0 to `num_clusters - 1`.
    pub num_clusters: usize,
    pub token_clusters: BTreeMap<String, usize>,
}

impl ColumnEncoding {
    /// Id assigned to tokens that were not present when the encoder was fitted.
    pub fn unseen_id(&self) -> usize {
        self.num_clusters
    }

    pub fn encode(&self, token: &str) -> usize {
        self.token_clusters
            .get(token)
            .copied()
            .unwrap_or_else(|| self.unseen_id())
    }
}

/// Categorical encoder produced by the clustering stage and shared by both
/// training stages.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct VarEncoder {
    pub columns: Vec<ColumnEncoding>,
}

impl VarEncoder {
    pub fn new(columns: Vec<ColumnEncoding>) -> Self {
        Self { columns }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnEncoding> {
        self.columns.iter().find(|c| c.column == name)
    }

    /// Cluster id of `token` in `column`, `None` when the column is unknown.
    pub fn encode(&self, column: &str, token: &str) -> Option<usize> {
        self.column(column).map(|c| c.encode(token))
    }

    /// Names of the columns appended by `transform`.
    pub fn feature_names(&self, table: &FeatureTable) -> Vec<String> {
        table
            .categorical_columns
            .iter()
            .map(|c| format!("{}_cluster", c))
            .collect()
    }

    /// Numeric matrix of `table` with one cluster-id column appended per
    /// categorical column.
    pub fn transform(&self, table: &FeatureTable) -> Result<Array2<f32>> {
        let encodings = table
            .categorical_columns
            .iter()
            .map(|name| {
                self.column(name).ok_or_else(|| {
                    PipelineError::Model(format!(
                        "encoder has no mapping for categorical column '{}'",
                        name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if encodings.is_empty() {
            return Ok(table.x.clone());
        }

        let mut encoded = Vec::with_capacity(table.nrows() * encodings.len());
        for row in &table.categorical {
            for (enc, token) in encodings.iter().zip(row.iter()) {
                encoded.push(enc.encode(token) as f32);
            }
        }
        let encoded = Array2::from_shape_vec((table.nrows(), encodings.len()), encoded)?;
        Ok(concatenate(Axis(1), &[table.x.view(), encoded.view()])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn encoder() -> VarEncoder {
        let mut token_clusters = BTreeMap::new();
        token_clusters.insert("int".to_string(), 0);
        token_clusters.insert("String".to_string(), 1);
        VarEncoder::new(vec![ColumnEncoding {
            column: "var_type".to_string(),
            num_clusters: 2,
            token_clusters,
        }])
    }

    #[test]
    fn test_unseen_tokens_use_reserved_id() {
        let enc = encoder();
        assert_eq!(enc.encode("var_type", "int"), Some(0));
        assert_eq!(enc.encode("var_type", "double"), Some(2));
        assert_eq!(enc.encode("operator", "int"), None);
    }

    #[test]
    fn test_transform_appends_columns() {
        let table = FeatureTable::new(
            Array2::from_shape_vec((3, 1), vec![1.0, 2.0, 3.0]).unwrap(),
            Array1::from_vec(vec![1, -1, 1]),
            vec!["depth".to_string()],
            vec![],
            vec![vec![], vec![], vec![]],
            vec!["var_type".to_string()],
            vec![
                vec!["String".to_string()],
                vec!["int".to_string()],
                vec!["char".to_string()],
            ],
        )
        .unwrap();

        let enc = encoder();
        let x = enc.transform(&table).unwrap();
        assert_eq!(x.shape(), &[3, 2]);
        assert_eq!(x.column(1).to_vec(), vec![1.0, 0.0, 2.0]);
        assert_eq!(enc.feature_names(&table), vec!["var_type_cluster".to_string()]);
    }

    #[test]
    fn test_transform_rejects_unknown_column() {
        let table = FeatureTable::new(
            Array2::zeros((1, 1)),
            Array1::from_vec(vec![1]),
            vec!["depth".to_string()],
            vec![],
            vec![vec![]],
            vec!["operator".to_string()],
            vec![vec!["==".to_string()]],
        )
        .unwrap();
        assert!(encoder().transform(&table).is_err());
    }
}
