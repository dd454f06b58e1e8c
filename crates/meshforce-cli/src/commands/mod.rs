pub mod evaluate;
pub mod flip;

use crate::config::PartialRunConfig;
use crate::error::{CliError, Result};
use meshforce::core::forcefield::params::ParamTable;
use meshforce::core::io::mesh_file::TomlMesh;
use meshforce::core::io::traits::MeshFormat;
use meshforce::core::models::system::MeshSystem;
use std::path::Path;
use tracing::info;

/// Reads a mesh file and layers the configuration's parameter overrides on top of the
/// parameters it stores.
fn load_mesh(path: &Path, config: &PartialRunConfig) -> Result<(MeshSystem, ParamTable)> {
    info!("Loading mesh from {:?}", path);
    let (system, mut params) = TomlMesh::read_from_path(path).map_err(|source| CliError::Mesh {
        path: path.to_path_buf(),
        source,
    })?;
    config.apply_params(&system.topology, &mut params)?;
    info!(
        triangles = system.topology.len(),
        particles = system.particles.n_owned(),
        types = system.topology.n_types(),
        "Mesh loaded"
    );
    Ok((system, params))
}
