use std::path::Path;

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;

use crate::config::{ModelConfig, ModelType};
use crate::error::{PipelineError, Result};
use crate::models::classifier_trait::ClassifierModel;

/// Gradient Boosting Decision Tree (GBDT) classifier
pub struct GBDTClassifier {
    model: Option<GBDT>,
    params: ModelConfig,
}

impl GBDTClassifier {
    pub fn new(params: ModelConfig) -> Self {
        GBDTClassifier {
            model: None,
            params,
        }
    }

    /// Load a model previously written by `save`.
    pub fn load(path: &Path, params: ModelConfig) -> Result<Self> {
        let file = path
            .to_str()
            .ok_or_else(|| PipelineError::Model(format!("non UTF-8 path {}", path.display())))?;
        let model = GBDT::load_model(file).map_err(|e| {
            PipelineError::Model(format!("failed to load {}: {}", path.display(), e))
        })?;
        Ok(Self {
            model: Some(model),
            params,
        })
    }

    fn to_data(x: &Array2<f32>, labels: Option<&[i32]>) -> DataVec {
        let mut data = DataVec::with_capacity(x.nrows());
        for (i, row) in x.outer_iter().enumerate() {
            let label = labels.map(|y| y[i] as f32).unwrap_or(0.0);
            data.push(Data::new_training_data(row.to_vec(), 1.0, label, None));
        }
        data
    }

    fn fitted(&self) -> Result<&GBDT> {
        self.model
            .as_ref()
            .ok_or_else(|| PipelineError::Model("GBDT model used before fit".to_string()))
    }
}

impl ClassifierModel for GBDTClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Shape(format!(
                "{} training rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(PipelineError::Shape(format!(
                "cannot fit GBDT on a {}x{} matrix",
                x.nrows(),
                x.ncols()
            )));
        }

        match &self.params.model_type {
            ModelType::GBDT {
                max_depth,
                num_boost_round,
                debug,
                training_optimization_level,
                loss_type,
            } => {
                let mut config = Config::new();

                config.set_feature_size(x.ncols());
                config.set_shrinkage(self.params.learning_rate);
                config.set_max_depth(*max_depth);
                config.set_iterations(*num_boost_round as usize);
                config.set_debug(*debug);
                config.set_training_optimization_level(*training_optimization_level);
                config.set_loss(loss_type);

                let mut gbdt = GBDT::new(&config);
                let mut train_x = Self::to_data(x, Some(y));

                log::debug!(
                    "Fitting GBDT on {} rows x {} features (depth {}, {} rounds)",
                    x.nrows(),
                    x.ncols(),
                    max_depth,
                    num_boost_round
                );
                gbdt.fit(&mut train_x);

                self.model = Some(gbdt);
            }
        }
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        let model = self.fitted()?;
        let test_x = Self::to_data(x, None);
        Ok(model.predict(&test_x))
    }

    fn save(&self, path: &Path) -> Result<()> {
        let model = self.fitted()?;
        if let Some(parent) = path.parent() {
            crate::io::ensure_dir(parent)?;
        }
        let file = path
            .to_str()
            .ok_or_else(|| PipelineError::Model(format!("non UTF-8 path {}", path.display())))?;
        model.save_model(file).map_err(|e| {
            PipelineError::Model(format!("failed to save {}: {}", path.display(), e))
        })
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}
