//! Clustering stage: groups categorical tokens of the variable table into a
//! small number of clusters and publishes the mapping as a `VarEncoder`.
//!
//! Each distinct token is described by two coordinates: the share of
//! positive rows it appears in and its log-scaled frequency. Tokens that
//! behave alike end up with the same id, which keeps the boosted models from
//! overfitting rare type names.
pub mod encoder;
pub mod kmeans;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ClusterConfig, RunConfig};
use crate::data_handling::FeatureTable;
use crate::error::Result;
use crate::io::{read_feature_table, write_json};
use crate::pipeline::Clusterer;

pub use encoder::{ColumnEncoding, VarEncoder};

/// Bundled clustering stage.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    config: ClusterConfig,
}

impl Cluster {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Location of the encoder written for this run.
    pub fn encoder_path(run: &RunConfig) -> PathBuf {
        run.subject_model_dir().join("cluster").join("var_encoder.json")
    }

    /// Fit one `ColumnEncoding` per categorical column of `table`.
    ///
    /// `max_clusters` bounds the number of clusters per column; it is
    /// clamped to at least one.
    pub fn fit_encoder(&self, table: &FeatureTable, max_clusters: usize) -> VarEncoder {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let labels = table.y.to_vec();
        let columns = table
            .categorical_columns
            .iter()
            .filter_map(|name| {
                let tokens = table.categorical_column(name)?;
                Some(self.fit_column(name, &tokens, &labels, max_clusters, &mut rng))
            })
            .collect();
        VarEncoder::new(columns)
    }

    fn fit_column(
        &self,
        name: &str,
        tokens: &[&str],
        labels: &[i32],
        max_clusters: usize,
        rng: &mut StdRng,
    ) -> ColumnEncoding {
        // token -> (occurrences, positive occurrences)
        let mut stats: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for (token, &label) in tokens.iter().zip(labels.iter()) {
            let entry = stats.entry(*token).or_insert((0, 0));
            entry.0 += 1;
            if label == 1 {
                entry.1 += 1;
            }
        }

        let max_count = stats.values().map(|s| s.0).max().unwrap_or(1);
        let norm = (1.0 + max_count as f64).ln();
        let vocab: Vec<&str> = stats.keys().copied().collect();
        let profiles: Vec<Vec<f64>> = stats
            .values()
            .map(|&(count, positives)| {
                vec![
                    positives as f64 / count as f64,
                    (1.0 + count as f64).ln() / norm,
                ]
            })
            .collect();

        let k = max_clusters.max(1).min(vocab.len().max(1));
        let result = kmeans::kmeans(&profiles, k, self.config.max_iterations, rng);

        // Renumber the non-empty clusters by ascending centroid coordinates so
        // ids are dense and stable across runs.
        let mut used: Vec<usize> = result.assignments.clone();
        used.sort_unstable();
        used.dedup();
        used.sort_by(|&a, &b| {
            let (ca, cb) = (&result.centroids[a], &result.centroids[b]);
            ca.iter()
                .zip(cb.iter())
                .map(|(x, y)| x.partial_cmp(y).unwrap_or(Ordering::Equal))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| a.cmp(&b))
        });
        let remap: BTreeMap<usize, usize> = used
            .iter()
            .enumerate()
            .map(|(new_id, &old_id)| (old_id, new_id))
            .collect();

        let token_clusters: BTreeMap<String, usize> = vocab
            .iter()
            .zip(result.assignments.iter())
            .map(|(token, a)| (token.to_string(), remap[a]))
            .collect();

        log::debug!(
            "Column '{}': {} distinct tokens grouped into {} clusters",
            name,
            vocab.len(),
            used.len()
        );

        ColumnEncoding {
            column: name.to_string(),
            num_clusters: used.len(),
            token_clusters,
        }
    }
}

impl Clusterer for Cluster {
    fn cluster_var(&mut self, run: &RunConfig) -> anyhow::Result<VarEncoder> {
        let path = run.var_table_path();
        log::info!("[Cluster] Reading variable features from {}", path.display());
        let table = read_feature_table(&path, &self.config.schema)?;
        table.log_input_data_summary("Cluster");

        let encoder = self.fit_encoder(&table, run.run_param as usize);

        let out = Self::encoder_path(run);
        write_json(&out, &encoder)?;
        log::info!("[Cluster] Wrote encoder to {}", out.display());
        Ok(encoder)
    }
}

/// Read back an encoder written by the clustering stage.
pub fn load_encoder(run: &RunConfig) -> Result<VarEncoder> {
    let path = Cluster::encoder_path(run);
    let content = std::fs::read_to_string(&path)
        .map_err(|e| crate::error::PipelineError::io(&path, e))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn table(tokens: &[&str], labels: &[i32]) -> FeatureTable {
        let n = tokens.len();
        FeatureTable::new(
            Array2::zeros((n, 1)),
            Array1::from_vec(labels.to_vec()),
            vec!["f".to_string()],
            vec![],
            vec![vec![]; n],
            vec!["var_type".to_string()],
            tokens.iter().map(|t| vec![t.to_string()]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_every_token_gets_a_cluster_below_k() {
        let t = table(
            &["int", "int", "String", "double", "char", "int", "String"],
            &[1, 1, -1, 1, -1, -1, -1],
        );
        let enc = Cluster::default().fit_encoder(&t, 2);
        let col = enc.column("var_type").unwrap();

        assert!(col.num_clusters >= 1 && col.num_clusters <= 2);
        assert_eq!(col.token_clusters.len(), 4);
        assert!(col.token_clusters.values().all(|&id| id < col.num_clusters));
        assert_eq!(col.encode("boolean"), col.num_clusters);
    }

    #[test]
    fn test_distinct_tokens_split_when_k_is_large() {
        // int: always positive, String: never positive, char: half.
        let t = table(
            &["int", "int", "String", "String", "char", "char"],
            &[1, 1, -1, -1, 1, -1],
        );
        let enc = Cluster::default().fit_encoder(&t, 10);
        let col = enc.column("var_type").unwrap();

        assert_eq!(col.num_clusters, 3);
        // Ids follow ascending positive rate.
        assert_eq!(col.encode("String"), 0);
        assert_eq!(col.encode("char"), 1);
        assert_eq!(col.encode("int"), 2);
    }

    #[test]
    fn test_fit_is_deterministic_for_a_seed() {
        let t = table(
            &["a", "b", "c", "d", "e", "a", "b", "c"],
            &[1, -1, 1, -1, 1, -1, 1, -1],
        );
        let cluster = Cluster::default();
        assert_eq!(cluster.fit_encoder(&t, 3), cluster.fit_encoder(&t, 3));
    }

    #[test]
    fn test_zero_clusters_is_clamped() {
        let t = table(&["a", "b"], &[1, -1]);
        let enc = Cluster::default().fit_encoder(&t, 0);
        assert_eq!(enc.column("var_type").unwrap().num_clusters, 1);
    }
}
