//! HTML summary of a training run.
use std::path::PathBuf;

use maud::{html, Markup, DOCTYPE};

use crate::config::{ModelConfig, ModelType, RunConfig};
use crate::error::{PipelineError, Result};
use crate::io::ensure_dir;
use crate::pipeline::PipelineSummary;
use crate::stats::MetricSummary;
use crate::trainer::StageReport;

fn metric_cell(m: &MetricSummary) -> String {
    format!("{:.4} ± {:.4}", m.mean, m.std_dev)
}

fn model_summary(model: &ModelConfig) -> String {
    match &model.model_type {
        ModelType::GBDT {
            max_depth,
            num_boost_round,
            loss_type,
            ..
        } => format!(
            "GBDT, {} rounds, depth {}, learning rate {}, loss {}",
            num_boost_round, max_depth, model.learning_rate, loss_type
        ),
    }
}

fn stage_section(report: &StageReport) -> Markup {
    html! {
        section {
            h2 { (report.stage) }
            p {
                (report.rows) " rows (" (report.positives) " positive), "
                (report.feature_names.len()) " features, stage parameter " (report.stage_param.to_string())
            }
            table {
                tr { th { "Metric" } th { "Mean ± std" } }
                tr { td { "AUC" } td { (metric_cell(&report.auc)) } }
                tr { td { "Accuracy" } td { (metric_cell(&report.accuracy)) } }
                tr { td { "Log-loss" } td { (metric_cell(&report.log_loss)) } }
                tr { td { "Pooled out-of-fold AUC" } td { (format!("{:.4}", report.pooled_auc)) } }
            }
            h3 { "Folds" }
            table {
                tr { th { "Fold" } th { "Test rows" } th { "AUC" } th { "Accuracy" } th { "Log-loss" } }
                @for fold in &report.folds {
                    tr {
                        td { (fold.fold) }
                        td { (fold.test_rows) }
                        td { (format!("{:.4}", fold.auc)) }
                        td { (format!("{:.4}", fold.accuracy)) }
                        td { (format!("{:.4}", fold.log_loss)) }
                    }
                }
            }
            p { "Model: " (model_summary(&report.model)) ", saved to " code { (report.model_path.display().to_string()) } }
        }
    }
}

/// Render the report for a finished run.
pub fn render_training_report(run: &RunConfig, summary: &PipelineSummary) -> String {
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let markup = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Training report: " (run.display_name()) }
            }
            body {
                h1 { "Training report: " (run.display_name()) }
                p { (run.fold_count) "-fold cross-validation, generated " (generated) }
                (stage_section(&summary.var))
                (stage_section(&summary.expr))
            }
        }
    };
    markup.into_string()
}

/// Write `training_report.html` into the subject output directory.
pub fn write_training_report(run: &RunConfig, summary: &PipelineSummary) -> Result<PathBuf> {
    let dir = run.subject_output_dir();
    ensure_dir(&dir)?;
    let path = dir.join("training_report.html");
    std::fs::write(&path, render_training_report(run, summary))
        .map_err(|e| PipelineError::io(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageParam;
    use crate::stats::FoldMetrics;

    fn stage(name: &str) -> StageReport {
        let folds = vec![
            FoldMetrics::compute(0, &[0.9, 0.1], &[1, -1]).unwrap(),
            FoldMetrics::compute(1, &[0.4, 0.6], &[1, -1]).unwrap(),
        ];
        StageReport {
            stage: name.to_string(),
            table_path: PathBuf::from("t.csv"),
            rows: 4,
            positives: 2,
            feature_names: vec!["a".to_string(), "b".to_string()],
            stage_param: StageParam(6),
            model: ModelConfig::new(0.1, ModelType::default().with_max_depth(6)),
            auc: MetricSummary::from_values(&folds.iter().map(|f| f.auc).collect::<Vec<_>>()),
            accuracy: MetricSummary::from_values(&[1.0, 0.0]),
            log_loss: MetricSummary::from_values(&[0.1, 0.9]),
            folds,
            pooled_auc: 0.5,
            model_path: PathBuf::from("model/x.json"),
            predictions_path: PathBuf::from("output/p.tsv"),
        }
    }

    #[test]
    fn test_report_mentions_both_stages() {
        let run = RunConfig::new("chart", "1", 5, "model/", "input/", "output/", 10);
        let summary = PipelineSummary {
            var: stage("XGVar"),
            expr: stage("XGExpr"),
        };
        let html = render_training_report(&run, &summary);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Training report: chart_1"));
        assert!(html.contains("XGVar"));
        assert!(html.contains("XGExpr"));
        assert!(html.contains("0.5000 ± 0.7071"));
        assert!(html.contains("GBDT, 50 rounds, depth 6"));
    }
}
