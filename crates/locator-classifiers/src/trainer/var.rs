use crate::cluster::VarEncoder;
use crate::config::{RunConfig, StageConfig, StageParam};
use crate::pipeline::VarTrainer;
use crate::trainer::{run_stage, StageLayout, StageReport};

/// Variable-level stage: learns which variables at a location deserve a predicate.
#[derive(Debug, Clone)]
pub struct XGVar {
    config: StageConfig,
}

impl XGVar {
    pub fn new(config: StageConfig) -> Self {
        Self { config }
    }
}

impl Default for XGVar {
    fn default() -> Self {
        Self::new(StageConfig::var_stage())
    }
}

impl VarTrainer for XGVar {
    fn train_var(
        &mut self,
        run: &RunConfig,
        encoder: &VarEncoder,
        stage_param: StageParam,
    ) -> anyhow::Result<StageReport> {
        let layout = StageLayout {
            name: "XGVar",
            dir: "var",
            table_path: run.var_table_path(),
        };
        Ok(run_stage(&layout, run, encoder, stage_param, &self.config)?)
    }
}
