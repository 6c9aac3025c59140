use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{PipelineError, Result};

fn check_lengths(predictions: &[f32], labels: &[i32]) -> Result<()> {
    if predictions.len() != labels.len() {
        return Err(PipelineError::Shape(format!(
            "{} predictions but {} labels",
            predictions.len(),
            labels.len()
        )));
    }
    Ok(())
}

/// Area under the ROC curve.
///
/// Computed from the Mann-Whitney U statistic with tied scores sharing their
/// average rank. Returns 0.5 when only one class is present.
///
/// # Arguments
///
/// * `scores` - Predicted scores, higher means more likely positive.
/// * `labels` - 1 for positive rows, anything else for negative rows.
pub fn roc_auc(scores: &[f32], labels: &[i32]) -> Result<f64> {
    check_lengths(scores, labels)?;

    let n_pos = labels.iter().filter(|&&l| l == 1).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Ok(0.5);
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Sum of 1-based ranks of the positives, ties get the mean rank of their run.
    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if labels[idx] == 1 {
                rank_sum += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Share of rows whose thresholded probability matches the label.
pub fn accuracy(probabilities: &[f32], labels: &[i32], threshold: f32) -> Result<f64> {
    check_lengths(probabilities, labels)?;
    if labels.is_empty() {
        return Ok(0.0);
    }
    let correct = probabilities
        .iter()
        .zip(labels.iter())
        .filter(|(&p, &l)| (p >= threshold) == (l == 1))
        .count();
    Ok(correct as f64 / labels.len() as f64)
}

/// Mean binary cross-entropy, with probabilities clipped away from 0 and 1.
pub fn log_loss(probabilities: &[f32], labels: &[i32]) -> Result<f64> {
    check_lengths(probabilities, labels)?;
    if labels.is_empty() {
        return Ok(0.0);
    }
    const EPS: f64 = 1e-15;
    let total: f64 = probabilities
        .iter()
        .zip(labels.iter())
        .map(|(&p, &l)| {
            let p = (p as f64).clamp(EPS, 1.0 - EPS);
            if l == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    Ok(total / labels.len() as f64)
}

/// Held-out metrics of one cross-validation fold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoldMetrics {
    pub fold: usize,
    pub test_rows: usize,
    pub auc: f64,
    pub accuracy: f64,
    pub log_loss: f64,
}

impl FoldMetrics {
    pub fn compute(fold: usize, probabilities: &[f32], labels: &[i32]) -> Result<Self> {
        Ok(Self {
            fold,
            test_rows: labels.len(),
            auc: roc_auc(probabilities, labels)?,
            accuracy: accuracy(probabilities, labels, 0.5)?,
            log_loss: log_loss(probabilities, labels)?,
        })
    }
}

/// Mean and standard deviation of a metric across folds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricSummary {
    pub mean: f64,
    pub std_dev: f64,
}

impl MetricSummary {
    /// Summary of `values`. The standard deviation is 0 for fewer than two values.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }
        let mean = values.iter().mean();
        let std_dev = if values.len() < 2 {
            0.0
        } else {
            values.iter().std_dev()
        };
        Self { mean, std_dev }
    }
}
