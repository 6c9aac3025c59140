use crate::cluster::VarEncoder;
use crate::config::{RunConfig, StageConfig, StageParam};
use crate::pipeline::ExprTrainer;
use crate::trainer::{run_stage, StageLayout, StageReport};

/// Expression-level stage: ranks candidate predicate expressions for a variable.
#[derive(Debug, Clone)]
pub struct XGExpr {
    config: StageConfig,
}

impl XGExpr {
    pub fn new(config: StageConfig) -> Self {
        Self { config }
    }
}

impl Default for XGExpr {
    fn default() -> Self {
        Self::new(StageConfig::expr_stage())
    }
}

impl ExprTrainer for XGExpr {
    fn train_expr(
        &mut self,
        run: &RunConfig,
        encoder: &VarEncoder,
        stage_param: StageParam,
    ) -> anyhow::Result<StageReport> {
        let layout = StageLayout {
            name: "XGExpr",
            dir: "expr",
            table_path: run.expr_table_path(),
        };
        Ok(run_stage(&layout, run, encoder, stage_param, &self.config)?)
    }
}
