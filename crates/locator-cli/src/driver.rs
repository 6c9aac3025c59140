//! Argument check, run configuration and stage sequencing for `train-model`.
use std::ffi::OsString;
use std::fmt;
use std::io::Write;

use locator_classifiers::config::{RunConfig, StageParam};
use locator_classifiers::pipeline::{run_pipeline, Clusterer, ExprTrainer, PipelineSummary, VarTrainer};

pub const DEFAULT_FOLD_COUNT: usize = 5;
pub const MODEL_DIR: &str = "model/";
pub const INPUT_DIR: &str = "input/";
pub const OUTPUT_DIR: &str = "output/";
pub const DEFAULT_RUN_PARAM: u32 = 10;
pub const VAR_STAGE_PARAM: StageParam = StageParam(11);
pub const EXPR_STAGE_PARAM: StageParam = StageParam(6);

/// Number of user arguments the binary accepts.
const EXPECTED_ARGS: usize = 2;

/// Wrong number of positional arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageError;

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wrong argument number!")
    }
}

impl std::error::Error for UsageError {}

/// How a driver invocation ended.
#[derive(Debug)]
pub enum DriverOutcome {
    Completed {
        config: RunConfig,
        summary: PipelineSummary,
    },
    Usage,
    StageFailed(anyhow::Error),
}

impl DriverOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverOutcome::Completed { .. } => 0,
            DriverOutcome::Usage => 1,
            DriverOutcome::StageFailed(_) => 2,
        }
    }
}

/// Run configuration for one subject/bug pair with the fixed run literals.
pub fn build_config(subject: impl Into<OsString>, bug_id: impl Into<OsString>) -> RunConfig {
    RunConfig::new(
        subject,
        bug_id,
        DEFAULT_FOLD_COUNT,
        MODEL_DIR,
        INPUT_DIR,
        OUTPUT_DIR,
        DEFAULT_RUN_PARAM,
    )
}

/// Validate the full argument list (program name first) and build the run configuration.
///
/// Exactly two user arguments are required; their values are taken verbatim,
/// byte for byte, without any UTF-8 conversion.
pub fn parse_args<I, T>(args: I) -> Result<RunConfig, UsageError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let user_args: Vec<OsString> = args.into_iter().skip(1).map(Into::into).collect();
    if user_args.len() != EXPECTED_ARGS {
        log::debug!("Expected {} arguments, got {}", EXPECTED_ARGS, user_args.len());
        return Err(UsageError);
    }
    let [subject, bug_id]: [OsString; EXPECTED_ARGS] =
        user_args.try_into().map_err(|_| UsageError)?;
    Ok(build_config(subject, bug_id))
}

/// Check the arguments, then cluster and train both models in order.
///
/// On a usage error the message goes to `out` and no stage is called.
pub fn drive<I, T, C, V, E>(
    args: I,
    out: &mut dyn Write,
    clusterer: &mut C,
    var_trainer: &mut V,
    expr_trainer: &mut E,
) -> DriverOutcome
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    C: Clusterer + ?Sized,
    V: VarTrainer + ?Sized,
    E: ExprTrainer + ?Sized,
{
    let config = match parse_args(args) {
        Ok(config) => config,
        Err(usage) => {
            let _ = writeln!(out, "{}", usage);
            let _ = out.flush();
            return DriverOutcome::Usage;
        }
    };

    match run_pipeline(
        &config,
        clusterer,
        var_trainer,
        expr_trainer,
        VAR_STAGE_PARAM,
        EXPR_STAGE_PARAM,
    ) {
        Ok(summary) => DriverOutcome::Completed { config, summary },
        Err(e) => DriverOutcome::StageFailed(e),
    }
}
