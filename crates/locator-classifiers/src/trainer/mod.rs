//! Cross-validated GBDT training shared by the variable and expression stages.
pub mod expr;
pub mod var;

use std::path::{Path, PathBuf};

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::cluster::VarEncoder;
use crate::config::{ModelConfig, RunConfig, StageConfig, StageParam};
use crate::data_handling::{complement, FeatureTable};
use crate::error::Result;
use crate::io::{read_feature_table, write_json, write_predictions_tsv};
use crate::models::factory::build_model;
use crate::stats::{roc_auc, FoldMetrics, MetricSummary};

pub use expr::XGExpr;
pub use var::XGVar;

/// Outcome of one training stage, also written as `metrics.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: String,
    pub table_path: PathBuf,
    pub rows: usize,
    pub positives: usize,
    pub feature_names: Vec<String>,
    pub stage_param: StageParam,
    /// Hyper-parameters of every model trained in this stage.
    pub model: ModelConfig,
    pub folds: Vec<FoldMetrics>,
    pub auc: MetricSummary,
    pub accuracy: MetricSummary,
    pub log_loss: MetricSummary,
    /// AUC over all out-of-fold predictions pooled together.
    pub pooled_auc: f64,
    pub model_path: PathBuf,
    pub predictions_path: PathBuf,
}

/// Paths and labels that tell the shared routine which stage it runs.
pub(crate) struct StageLayout {
    pub name: &'static str,
    /// Sub-directory under the subject model/output directories.
    pub dir: &'static str,
    pub table_path: PathBuf,
}

impl StageLayout {
    fn model_path(&self, run: &RunConfig) -> PathBuf {
        run.subject_model_dir()
            .join(self.dir)
            .join(format!("{}_model.json", self.dir))
    }

    fn output_dir(&self, run: &RunConfig) -> PathBuf {
        run.subject_output_dir().join(self.dir)
    }
}

/// Out-of-fold probabilities and per-fold metrics.
pub fn cross_validate(
    x: &Array2<f32>,
    table: &FeatureTable,
    model_config: &ModelConfig,
    n_folds: usize,
    seed: u64,
) -> Result<(Vec<f32>, Vec<FoldMetrics>)> {
    let folds = table.stratified_folds(n_folds, seed)?;
    let labels = table.y.to_vec();
    let mut out_of_fold = vec![0.0f32; table.nrows()];
    let mut metrics = Vec::with_capacity(folds.len());

    for (fold, test_indices) in folds.iter().enumerate() {
        let train_indices = complement(table.nrows(), test_indices);
        log::info!(
            "Learning on cross-validation fold {} with {} training rows",
            fold,
            train_indices.len()
        );

        let train_y: Vec<i32> = train_indices.iter().map(|&i| labels[i]).collect();
        let test_y: Vec<i32> = test_indices.iter().map(|&i| labels[i]).collect();

        let mut model = build_model(model_config.clone());
        model.fit(&x.select(Axis(0), &train_indices), &train_y)?;
        let probs = model.predict_proba(&x.select(Axis(0), test_indices))?;

        for (&row, &p) in test_indices.iter().zip(probs.iter()) {
            out_of_fold[row] = p;
        }

        let fold_metrics = FoldMetrics::compute(fold, &probs, &test_y)?;
        log::debug!(
            "Fold {}: auc={:.4} accuracy={:.4} log_loss={:.4}",
            fold,
            fold_metrics.auc,
            fold_metrics.accuracy,
            fold_metrics.log_loss
        );
        metrics.push(fold_metrics);
    }

    Ok((out_of_fold, metrics))
}

/// Read the stage table, cross-validate, fit the final model and write every artifact.
pub(crate) fn run_stage(
    layout: &StageLayout,
    run: &RunConfig,
    encoder: &VarEncoder,
    stage_param: StageParam,
    config: &StageConfig,
) -> Result<StageReport> {
    log::info!(
        "[{}] Reading features from {}",
        layout.name,
        layout.table_path.display()
    );
    let table = read_feature_table(&layout.table_path, &config.schema)?;
    table.log_input_data_summary(layout.name);

    let x = encoder.transform(&table)?;
    let mut feature_names = table.feature_names.clone();
    feature_names.extend(encoder.feature_names(&table));

    let model_config = ModelConfig::new(
        config.model.learning_rate,
        config.model.model_type.with_max_depth(stage_param.get()),
    );

    let (out_of_fold, folds) =
        cross_validate(&x, &table, &model_config, run.fold_count, config.seed)?;
    let labels = table.y.to_vec();
    let pooled_auc = roc_auc(&out_of_fold, &labels)?;

    let mut model = build_model(model_config.clone());
    log::info!(
        "[{}] Fitting final {} model on all {} rows",
        layout.name,
        model.name(),
        table.nrows()
    );
    model.fit(&x, &labels)?;
    let model_path = layout.model_path(run);
    model.save(&model_path)?;

    let output_dir = layout.output_dir(run);
    let predictions_path = output_dir.join("predictions.tsv");
    write_predictions_tsv(&predictions_path, &table, &out_of_fold)?;

    let summarize = |f: fn(&FoldMetrics) -> f64| {
        MetricSummary::from_values(&folds.iter().map(f).collect::<Vec<_>>())
    };
    let report = StageReport {
        stage: layout.name.to_string(),
        table_path: layout.table_path.clone(),
        rows: table.nrows(),
        positives: table.num_positives(),
        feature_names,
        stage_param,
        model: model_config,
        auc: summarize(|m| m.auc),
        accuracy: summarize(|m| m.accuracy),
        log_loss: summarize(|m| m.log_loss),
        folds,
        pooled_auc,
        model_path,
        predictions_path,
    };
    write_json(output_dir.join("metrics.json"), &report)?;

    log::info!(
        "[{}] Cross-validated AUC {:.4} ± {:.4}, model saved to {}",
        layout.name,
        report.auc.mean,
        report.auc.std_dev,
        report.model_path.display()
    );
    Ok(report)
}

/// Read a `metrics.json` written by a training stage.
pub fn load_stage_report(path: &Path) -> Result<StageReport> {
    let content =
        std::fs::read_to_string(path).map_err(|e| crate::error::PipelineError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}
