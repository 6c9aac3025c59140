use ndarray::Array2;

use crate::error::Result;

/// Contract shared by the boosted models used in the training stages.
pub trait ClassifierModel {
    /// Fit the model. `y` uses the crate convention (1 positive, -1 negative).
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<()>;

    /// Probability (0..1) of the positive class for every row of `x`.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>>;

    /// Persist the fitted model to `path`.
    fn save(&self, path: &std::path::Path) -> Result<()>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
