use super::backend::{EngineCommon, ForceEngine};
use super::comm::Communicator;
use super::config::{Backend, EngineConfig};
use super::error::EngineError;
use super::tasks::{coefficients, gather::resolve_triangle};
use crate::core::forcefield::params::TriangleAreaParams;
use crate::core::forcefield::potentials::{
    TriangleGeometry, area_share, triangle_area_conservation,
};
use crate::core::forcefield::term::{ForceOutput, Virial};
use crate::core::models::ids::TriangleTypeId;
use crate::core::models::system::MeshSystem;
use std::sync::Arc;
use tracing::{instrument, trace};

/// Sequential force engine: one pass over the triangles, in order.
pub struct ReferenceEngine {
    common: EngineCommon,
}

impl ReferenceEngine {
    pub fn new(config: &EngineConfig, n_types: usize, comm: Arc<dyn Communicator>) -> Self {
        Self {
            common: EngineCommon::new(config, n_types, comm),
        }
    }
}

impl ForceEngine for ReferenceEngine {
    fn backend(&self) -> Backend {
        Backend::Reference
    }

    fn set_params(
        &mut self,
        type_id: TriangleTypeId,
        k: f64,
        a_mesh: f64,
    ) -> Result<(), EngineError> {
        self.common.set_params(type_id, k, a_mesh)
    }

    fn params(&self, type_id: TriangleTypeId) -> Result<TriangleAreaParams, EngineError> {
        self.common.params(type_id)
    }

    #[instrument(skip_all, name = "reference_compute_forces", fields(timestep = timestep))]
    fn compute_forces(
        &mut self,
        timestep: u64,
        system: &MeshSystem,
    ) -> Result<&ForceOutput, EngineError> {
        let particles = &system.particles;
        let positions = particles.positions();
        let n_owned = particles.n_owned();

        self.common.evaluate(n_owned, |common| {
            let coeffs = coefficients::resolve(&common.params, &system.topology)?;

            // Validate all connectivity before accumulating anything.
            let resolved = system
                .topology
                .triangles()
                .iter()
                .enumerate()
                .map(|(i, triangle)| resolve_triangle(i, triangle, particles))
                .collect::<Result<Vec<_>, _>>()?;

            let distributed = common.comm.is_distributed();
            let compute_virial = common.compute_virial;
            let output = &mut common.output;
            let mut local_area = 0.0;

            for (triangle, vertices) in system.topology.triangles().iter().zip(&resolved) {
                let [a, b, c] = *vertices;
                let geom =
                    TriangleGeometry::new(&positions[a], &positions[b], &positions[c], &system.pbox);
                let coeff = coeffs[triangle.type_id.index()];
                let term = triangle_area_conservation(&geom, coeff.k, coeff.target_area);

                local_area += area_share(geom.area(), [a, b, c].map(|j| j < n_owned), distributed);

                for (slot, &j) in vertices.iter().enumerate() {
                    if j >= n_owned {
                        continue;
                    }
                    let f = term.forces[slot];
                    output.forces[j] += f;
                    output.energies[j] += term.vertex_energy;
                    if compute_virial {
                        output.virials[j] += Virial::from_position_force(&positions[j], &f);
                    }
                }
            }

            trace!(
                local_area,
                n_triangles = resolved.len(),
                "Reference evaluation finished"
            );
            Ok(local_area)
        })
    }

    fn output(&self) -> &ForceOutput {
        &self.common.output
    }

    fn is_distributed(&self) -> bool {
        self.common.comm.is_distributed()
    }
}
