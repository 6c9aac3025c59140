use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Parameters shared read-only by every stage of one training run.
///
/// Built once by the driver and never mutated afterwards. The field order
/// follows the positional order the driver receives them in. The two
/// identifiers are kept as raw OS strings so the run directories are exactly
/// the ones the caller named, even when they are not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// First caller-supplied identifier: the subject (project) name.
    pub subject: OsString,
    /// Second caller-supplied identifier: the bug/version id within the subject.
    pub bug_id: OsString,
    /// Number of cross-validation folds.
    pub fold_count: usize,
    /// Directory receiving trained artifacts.
    pub model_dir: PathBuf,
    /// Directory holding the feature tables.
    pub input_dir: PathBuf,
    /// Directory receiving predictions, metrics and reports.
    pub output_dir: PathBuf,
    /// Opaque numeric run parameter. Its meaning belongs to the stage
    /// implementations; the bundled clustering stage reads it as the
    /// upper bound on the number of token clusters.
    pub run_param: u32,
}

impl RunConfig {
    pub fn new(
        subject: impl Into<OsString>,
        bug_id: impl Into<OsString>,
        fold_count: usize,
        model_dir: impl Into<PathBuf>,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        run_param: u32,
    ) -> Self {
        Self {
            subject: subject.into(),
            bug_id: bug_id.into(),
            fold_count,
            model_dir: model_dir.into(),
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            run_param,
        }
    }

    /// `{subject}_{bug_id}`, the stem used for every per-run file name.
    pub fn name_and_id(&self) -> OsString {
        let mut stem = self.subject.clone();
        stem.push("_");
        stem.push(&self.bug_id);
        stem
    }

    /// `name_and_id` for logs and reports; invalid UTF-8 is replaced.
    pub fn display_name(&self) -> String {
        self.name_and_id().to_string_lossy().into_owned()
    }

    fn table_file_name(&self, suffix: &str) -> OsString {
        let mut name = self.name_and_id();
        name.push(suffix);
        name
    }

    pub fn subject_input_dir(&self) -> PathBuf {
        self.input_dir.join(&self.subject).join(self.name_and_id())
    }

    pub fn var_table_path(&self) -> PathBuf {
        self.subject_input_dir()
            .join("var")
            .join(self.table_file_name(".var.csv"))
    }

    pub fn expr_table_path(&self) -> PathBuf {
        self.subject_input_dir()
            .join("expr")
            .join(self.table_file_name(".expr.csv"))
    }

    pub fn subject_model_dir(&self) -> PathBuf {
        self.model_dir.join(&self.subject).join(self.name_and_id())
    }

    pub fn subject_output_dir(&self) -> PathBuf {
        self.output_dir.join(&self.subject).join(self.name_and_id())
    }
}

/// Integer handed to a training stage. The bundled GBDT trainers use it as
/// the maximum tree depth.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageParam(pub u32);

impl StageParam {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StageParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub learning_rate: f32,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    GBDT {
        max_depth: u32,
        num_boost_round: u32,
        debug: bool,
        training_optimization_level: u8,
        loss_type: String,
    },
}

impl ModelType {
    /// Copy of `self` with the tree depth replaced.
    pub fn with_max_depth(&self, depth: u32) -> Self {
        match self {
            ModelType::GBDT {
                num_boost_round,
                debug,
                training_optimization_level,
                loss_type,
                ..
            } => ModelType::GBDT {
                max_depth: depth,
                num_boost_round: *num_boost_round,
                debug: *debug,
                training_optimization_level: *training_optimization_level,
                loss_type: loss_type.clone(),
            },
        }
    }
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::GBDT {
            max_depth: 6,
            num_boost_round: 50,
            debug: false,
            training_optimization_level: 2,
            loss_type: "LogLikelyhood".to_string(),
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gbdt" => Ok(ModelType::default()),
            _ => Err(format!("Unknown model type: {}", s)),
        }
    }
}

impl ModelConfig {
    pub fn new(learning_rate: f32, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            model_type: ModelType::default(),
        }
    }
}

/// Column roles of a feature table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Column holding the binary label (1 positive, 0 or -1 negative).
    pub label_column: String,
    /// Columns carried through verbatim to the prediction output.
    pub id_columns: Vec<String>,
    /// String columns encoded through the `VarEncoder`.
    pub categorical_columns: Vec<String>,
}

impl TableSchema {
    pub fn var_table() -> Self {
        Self {
            label_column: "label".to_string(),
            id_columns: vec!["key".to_string(), "var_name".to_string()],
            categorical_columns: vec!["var_type".to_string()],
        }
    }

    pub fn expr_table() -> Self {
        Self {
            label_column: "label".to_string(),
            id_columns: vec![
                "key".to_string(),
                "var_name".to_string(),
                "expr".to_string(),
            ],
            categorical_columns: vec!["var_type".to_string()],
        }
    }
}

impl Default for TableSchema {
    fn default() -> Self {
        Self::var_table()
    }
}

/// Settings of the clustering stage.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub schema: TableSchema,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            schema: TableSchema::var_table(),
            max_iterations: 100,
            seed: 42,
        }
    }
}

/// Settings of a boosted training stage.
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub model: ModelConfig,
    pub schema: TableSchema,
    /// Seed for the fold shuffle.
    pub seed: u64,
}

impl StageConfig {
    pub fn var_stage() -> Self {
        Self {
            model: ModelConfig::default(),
            schema: TableSchema::var_table(),
            seed: 42,
        }
    }

    pub fn expr_stage() -> Self {
        Self {
            model: ModelConfig::default(),
            schema: TableSchema::expr_table(),
            seed: 42,
        }
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::var_stage()
    }
}
