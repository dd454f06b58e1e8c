use super::load_mesh;
use crate::cli::FlipArgs;
use crate::config::PartialRunConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use meshforce::core::io::mesh_file::TomlMesh;
use meshforce::core::io::traits::MeshFormat;
use meshforce::engine::backend::create_engine;
use meshforce::engine::comm::SerialCommunicator;
use meshforce::engine::progress::ProgressReporter;
use meshforce::workflows::{evaluate::load_params, flip};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub fn run(args: FlipArgs) -> Result<()> {
    let config = PartialRunConfig::load(args.config.as_deref())?;
    let (mut system, params) = load_mesh(&args.mesh, &config)?;

    info!("Merging configuration from file and CLI arguments...");
    let (engine_config, flip_config) = config.merge_flip(&args)?;

    let mut engine = create_engine(
        &engine_config,
        system.topology.n_types(),
        Arc::new(SerialCommunicator),
    );
    load_params(engine.as_mut(), &params)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting {} edge-flip sweep(s) at T = {}...",
        flip_config.sweeps, flip_config.temperature
    );
    let report = flip::run(&mut system, engine.as_mut(), &flip_config, &reporter)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.mesh));
    info!("Writing flipped mesh to {:?}", &output_path);
    TomlMesh::write_to_path(&system, &params, &output_path).map_err(|source| CliError::Mesh {
        path: output_path.clone(),
        source,
    })?;

    println!(
        "Accepted {} of {} attempted flips.",
        report.accepted, report.attempted
    );
    println!(
        "Energy: {:.10e} -> {:.10e}",
        report.energy_before, report.energy_after
    );
    println!(
        "Area:   {:.10} -> {:.10}",
        report.area_before, report.area_after
    );
    println!("Mesh written to: {}", output_path.display());
    Ok(())
}

/// `vesicle.toml` becomes `vesicle.flipped.toml` next to the input.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh");
    input.with_file_name(format!("{stem}.flipped.toml"))
}
