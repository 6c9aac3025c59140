//! Stage interfaces and the fixed order in which a training run calls them.
//!
//! A run is three calls on one thread: clustering produces the `VarEncoder`,
//! then the variable trainer and the expression trainer each borrow that same
//! encoder. The first failing stage ends the run; nothing is retried or
//! rolled back.
use anyhow::{Context, Result};

use crate::cluster::VarEncoder;
use crate::config::{RunConfig, StageParam};
use crate::trainer::StageReport;

/// Produces the categorical encoder from the variable features.
pub trait Clusterer {
    fn cluster_var(&mut self, run: &RunConfig) -> Result<VarEncoder>;
}

/// Trains the variable-level model.
pub trait VarTrainer {
    fn train_var(
        &mut self,
        run: &RunConfig,
        encoder: &VarEncoder,
        stage_param: StageParam,
    ) -> Result<StageReport>;
}

/// Trains the expression-level model.
pub trait ExprTrainer {
    fn train_expr(
        &mut self,
        run: &RunConfig,
        encoder: &VarEncoder,
        stage_param: StageParam,
    ) -> Result<StageReport>;
}

/// Reports of both training stages of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub var: StageReport,
    pub expr: StageReport,
}

/// Cluster, then train the variable model, then the expression model.
///
/// The encoder returned by `clusterer` is passed by reference, unchanged, to
/// both trainers.
pub fn run_pipeline<C, V, E>(
    run: &RunConfig,
    clusterer: &mut C,
    var_trainer: &mut V,
    expr_trainer: &mut E,
    var_param: StageParam,
    expr_param: StageParam,
) -> Result<PipelineSummary>
where
    C: Clusterer + ?Sized,
    V: VarTrainer + ?Sized,
    E: ExprTrainer + ?Sized,
{
    log::info!(
        "Training run for {} ({} folds)",
        run.display_name(),
        run.fold_count
    );

    let var_encoder = clusterer
        .cluster_var(run)
        .context("clustering stage failed")?;

    let var = var_trainer
        .train_var(run, &var_encoder, var_param)
        .context("variable training stage failed")?;

    let expr = expr_trainer
        .train_expr(run, &var_encoder, expr_param)
        .context("expression training stage failed")?;

    Ok(PipelineSummary { var, expr })
}
