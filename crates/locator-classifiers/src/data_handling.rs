//! In-memory feature tables and the fold split used by the trainers.
//!
//! A `FeatureTable` keeps the numeric feature matrix next to the row labels,
//! the id values that are echoed into prediction files, and the raw
//! categorical tokens that the `VarEncoder` turns into extra features.
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// Numeric features, one row per sample.
    pub x: Array2<f32>,
    /// Labels: 1 for positive samples, -1 for negative ones.
    pub y: Array1<i32>,
    /// Names of the columns of `x`.
    pub feature_names: Vec<String>,
    pub id_columns: Vec<String>,
    /// Id values per row, aligned with `id_columns`.
    pub ids: Vec<Vec<String>>,
    pub categorical_columns: Vec<String>,
    /// Categorical tokens per row, aligned with `categorical_columns`.
    pub categorical: Vec<Vec<String>>,
}

impl FeatureTable {
    pub fn new(
        x: Array2<f32>,
        y: Array1<i32>,
        feature_names: Vec<String>,
        id_columns: Vec<String>,
        ids: Vec<Vec<String>>,
        categorical_columns: Vec<String>,
        categorical: Vec<Vec<String>>,
    ) -> Result<Self> {
        let n = x.nrows();
        if y.len() != n || ids.len() != n || categorical.len() != n {
            return Err(PipelineError::Shape(format!(
                "{} feature rows but {} labels, {} id rows, {} categorical rows",
                n,
                y.len(),
                ids.len(),
                categorical.len()
            )));
        }
        if feature_names.len() != x.ncols() {
            return Err(PipelineError::Shape(format!(
                "{} feature columns but {} feature names",
                x.ncols(),
                feature_names.len()
            )));
        }
        Ok(Self {
            x,
            y,
            feature_names,
            id_columns,
            ids,
            categorical_columns,
            categorical,
        })
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn num_positives(&self) -> usize {
        self.y.iter().filter(|&&v| v == 1).count()
    }

    pub fn num_negatives(&self) -> usize {
        self.y.iter().filter(|&&v| v == -1).count()
    }

    /// Tokens of one categorical column, in row order.
    pub fn categorical_column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.categorical_columns.iter().position(|c| c == name)?;
        Some(self.categorical.iter().map(|row| row[idx].as_str()).collect())
    }

    pub fn log_input_data_summary(&self, stage: &str) {
        log::info!(
            "[{}] {} rows ({} positive, {} negative), {} numeric and {} categorical columns",
            stage,
            self.nrows(),
            self.num_positives(),
            self.num_negatives(),
            self.x.ncols(),
            self.categorical_columns.len()
        );
    }

    /// Split row indices into `n_folds` disjoint test folds.
    ///
    /// Positives and negatives are shuffled separately and dealt round-robin,
    /// so every fold receives a share of both classes. The union of all folds
    /// is every row exactly once.
    pub fn stratified_folds(&self, n_folds: usize, seed: u64) -> Result<Vec<Vec<usize>>> {
        if n_folds < 2 {
            return Err(PipelineError::Shape(format!(
                "cross-validation needs at least 2 folds, got {}",
                n_folds
            )));
        }
        if self.nrows() < n_folds {
            return Err(PipelineError::Shape(format!(
                "cannot split {} rows into {} folds",
                self.nrows(),
                n_folds
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut positives: Vec<usize> = (0..self.nrows()).filter(|&i| self.y[i] == 1).collect();
        let mut negatives: Vec<usize> = (0..self.nrows()).filter(|&i| self.y[i] != 1).collect();
        positives.shuffle(&mut rng);
        negatives.shuffle(&mut rng);

        let mut folds = vec![Vec::new(); n_folds];
        // Negatives continue the deal where positives stopped so fold sizes stay balanced.
        for (slot, idx) in positives.into_iter().chain(negatives).enumerate() {
            folds[slot % n_folds].push(idx);
        }

        for (i, fold) in folds.iter().enumerate() {
            log::trace!("Fold {} holds {} test rows", i, fold.len());
        }
        Ok(folds)
    }
}

/// Indices of `0..n` that are not in `excluded`.
pub fn complement(n: usize, excluded: &[usize]) -> Vec<usize> {
    let mut mask = vec![true; n];
    for &i in excluded {
        mask[i] = false;
    }
    (0..n).filter(|&i| mask[i]).collect()
}
