use log::LevelFilter;

use locator_classifiers::cluster::Cluster;
use locator_classifiers::report::write_training_report;
use locator_classifiers::trainer::{XGExpr, XGVar};
use locator_cli::driver::{drive, DriverOutcome};

fn main() {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default().filter_or("LOCATOR_LOG", "error,locator=info,train_model=info"),
        )
        .init();

    let mut stdout = std::io::stdout();
    let outcome = drive(
        std::env::args_os(),
        &mut stdout,
        &mut Cluster::default(),
        &mut XGVar::default(),
        &mut XGExpr::default(),
    );

    match &outcome {
        DriverOutcome::Completed { config, summary } => {
            match write_training_report(config, summary) {
                Ok(path) => log::info!("Training report written to {}", path.display()),
                Err(e) => log::warn!("Could not write training report: {}", e),
            }
        }
        DriverOutcome::Usage => {}
        DriverOutcome::StageFailed(e) => log::error!("Training failed: {:#}", e),
    }

    std::process::exit(outcome.exit_code());
}
