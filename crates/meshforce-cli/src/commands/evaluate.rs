use super::load_mesh;
use crate::cli::EvaluateArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use meshforce::engine::comm::SerialCommunicator;
use meshforce::engine::progress::ProgressReporter;
use meshforce::workflows::evaluate::{self, EvaluationReport};
use std::sync::Arc;
use tracing::info;

pub fn run(args: EvaluateArgs) -> Result<()> {
    let config = PartialRunConfig::load(args.config.as_deref())?;
    let (system, params) = load_mesh(&args.mesh, &config)?;

    info!("Merging configuration from file and CLI arguments...");
    let (engine_config, steps) = config.merge_evaluate(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the evaluation workflow...");
    let report = evaluate::run(
        &system,
        &params,
        &engine_config,
        steps,
        Arc::new(SerialCommunicator),
        &reporter,
    )?;

    println!("{}", render(&report));
    Ok(())
}

fn render(report: &EvaluationReport) -> String {
    let v = report.virial.0;
    format!(
        "backend:      {}\n\
         steps:        {}\n\
         total area:   {:.10}\n\
         total energy: {:.10e}\n\
         net force:    [{:.4e}, {:.4e}, {:.4e}]\n\
         max |force|:  {:.10e}\n\
         virial:       [{:.4e}, {:.4e}, {:.4e}, {:.4e}, {:.4e}, {:.4e}]",
        report.backend,
        report.steps,
        report.total_area,
        report.total_energy,
        report.net_force.x,
        report.net_force.y,
        report.net_force.z,
        report.max_force,
        v[0],
        v[1],
        v[2],
        v[3],
        v[4],
        v[5],
    )
}
