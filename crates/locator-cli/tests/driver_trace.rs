//! Drives `train-model`'s entry logic with recording stages in place of the
//! bundled clustering and GBDT trainers.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use locator_classifiers::cluster::{ColumnEncoding, VarEncoder};
use locator_classifiers::config::{ModelConfig, RunConfig, StageParam};
use locator_classifiers::pipeline::{Clusterer, ExprTrainer, VarTrainer};
use locator_classifiers::stats::MetricSummary;
use locator_classifiers::trainer::StageReport;
use locator_cli::driver::{drive, DriverOutcome};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Cluster(RunConfig),
    Var(RunConfig, StageParam, usize),
    Expr(RunConfig, StageParam, usize),
}

type Log = Rc<RefCell<Vec<Call>>>;

fn empty_report(stage: &str, stage_param: StageParam) -> StageReport {
    let zero = MetricSummary::from_values(&[]);
    StageReport {
        stage: stage.to_string(),
        table_path: PathBuf::new(),
        rows: 0,
        positives: 0,
        feature_names: vec![],
        stage_param,
        model: ModelConfig::default(),
        folds: vec![],
        auc: zero,
        accuracy: zero,
        log_loss: zero,
        pooled_auc: 0.5,
        model_path: PathBuf::new(),
        predictions_path: PathBuf::new(),
    }
}

struct Recorder {
    log: Log,
    fail_at: Option<&'static str>,
}

impl Recorder {
    fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            fail_at: None,
        }
    }

    fn failing(log: &Log, stage: &'static str) -> Self {
        Self {
            log: log.clone(),
            fail_at: Some(stage),
        }
    }
}

impl Clusterer for Recorder {
    fn cluster_var(&mut self, run: &RunConfig) -> anyhow::Result<VarEncoder> {
        self.log.borrow_mut().push(Call::Cluster(run.clone()));
        if self.fail_at == Some("cluster") {
            anyhow::bail!("cluster exploded");
        }
        Ok(VarEncoder::new(vec![ColumnEncoding {
            column: "var_type".to_string(),
            num_clusters: 1,
            token_clusters: [("int".to_string(), 0)].into_iter().collect(),
        }]))
    }
}

impl VarTrainer for Recorder {
    fn train_var(
        &mut self,
        run: &RunConfig,
        encoder: &VarEncoder,
        stage_param: StageParam,
    ) -> anyhow::Result<StageReport> {
        let addr = encoder as *const VarEncoder as usize;
        self.log
            .borrow_mut()
            .push(Call::Var(run.clone(), stage_param, addr));
        if self.fail_at == Some("var") {
            anyhow::bail!("var exploded");
        }
        Ok(empty_report("var", stage_param))
    }
}

impl ExprTrainer for Recorder {
    fn train_expr(
        &mut self,
        run: &RunConfig,
        encoder: &VarEncoder,
        stage_param: StageParam,
    ) -> anyhow::Result<StageReport> {
        let addr = encoder as *const VarEncoder as usize;
        self.log
            .borrow_mut()
            .push(Call::Expr(run.clone(), stage_param, addr));
        Ok(empty_report("expr", stage_param))
    }
}

fn run(args: &[&str], fail_at: Option<&'static str>) -> (DriverOutcome, Vec<Call>, String) {
    let log: Log = Rc::default();
    let mut out = Vec::new();
    let mut cluster = match fail_at {
        Some(stage) => Recorder::failing(&log, stage),
        None => Recorder::new(&log),
    };
    let mut var = match fail_at {
        Some(stage) => Recorder::failing(&log, stage),
        None => Recorder::new(&log),
    };
    let mut expr = Recorder::new(&log);

    let outcome = drive(
        args.iter().copied(),
        &mut out,
        &mut cluster,
        &mut var,
        &mut expr,
    );
    let calls = log.borrow().clone();
    (outcome, calls, String::from_utf8(out).unwrap())
}

#[test]
fn two_args_run_every_stage_once_in_order() {
    let (outcome, calls, stdout) = run(&["train-model", "cfgA", "cfgB"], None);

    assert_eq!(outcome.exit_code(), 0);
    assert!(stdout.is_empty());

    let expected = RunConfig::new("cfgA", "cfgB", 5, "model/", "input/", "output/", 10);
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], Call::Cluster(expected.clone()));

    let (var_addr, expr_addr) = match (&calls[1], &calls[2]) {
        (Call::Var(var_run, var_param, a), Call::Expr(expr_run, expr_param, b)) => {
            assert_eq!(var_run, &expected);
            assert_eq!(expr_run, &expected);
            assert_eq!(*var_param, StageParam(11));
            assert_eq!(*expr_param, StageParam(6));
            (*a, *b)
        }
        other => panic!("unexpected call order: {:?}", other),
    };
    assert_eq!(var_addr, expr_addr, "both trainers must see the same encoder");

    match outcome {
        DriverOutcome::Completed { config, summary } => {
            assert_eq!(config, expected);
            assert_eq!(summary.var.stage_param, StageParam(11));
            assert_eq!(summary.expr.stage_param, StageParam(6));
        }
        other => panic!("expected a completed run, got {:?}", other),
    }
}

#[test]
fn arguments_are_passed_verbatim() {
    let (_, calls, _) = run(&["train-model", "", "-v"], None);
    match &calls[0] {
        Call::Cluster(run) => {
            assert_eq!(run.subject, "");
            assert_eq!(run.bug_id, "-v");
        }
        other => panic!("unexpected first call: {:?}", other),
    }
}

#[test]
fn wrong_arity_calls_no_stage() {
    for args in [
        vec!["train-model"],
        vec!["train-model", "cfgA"],
        vec!["train-model", "cfgA", "cfgB", "cfgC"],
    ] {
        let (outcome, calls, stdout) = run(&args, None);
        assert_eq!(outcome.exit_code(), 1);
        assert!(calls.is_empty());
        assert_eq!(stdout, "Wrong argument number!\n");
    }
}

#[test]
fn cluster_failure_skips_training() {
    let (outcome, calls, stdout) = run(&["train-model", "cfgA", "cfgB"], Some("cluster"));
    assert_eq!(outcome.exit_code(), 2);
    assert_eq!(calls.len(), 1);
    assert!(stdout.is_empty());
    match outcome {
        DriverOutcome::StageFailed(e) => assert!(format!("{:#}", e).contains("cluster exploded")),
        other => panic!("expected a stage failure, got {:?}", other),
    }
}

#[test]
fn var_failure_skips_expression_training() {
    let (outcome, calls, _) = run(&["train-model", "cfgA", "cfgB"], Some("var"));
    assert_eq!(outcome.exit_code(), 2);
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[1], Call::Var(..)));
}
