use super::accelerated::AcceleratedEngine;
use super::comm::Communicator;
use super::config::{Backend, EngineConfig};
use super::error::EngineError;
use super::reference::ReferenceEngine;
use crate::core::forcefield::params::{ParamTable, TriangleAreaParams};
use crate::core::forcefield::potentials::quad_flip_energy_difference;
use crate::core::forcefield::term::ForceOutput;
use crate::core::models::ids::{ParticleTag, TriangleTypeId};
use crate::core::models::system::MeshSystem;
use crate::core::models::topology::MeshTopology;
use std::sync::Arc;

/// A triangle area-conservation force engine for one mesh partition.
///
/// Implementations differ only in how they schedule work; given the same mesh, positions
/// and parameters they produce the same per-particle forces and energies and the same
/// total area up to floating-point summation order.
pub trait ForceEngine: Send {
    fn backend(&self) -> Backend;

    /// Stores `K` and `A_mesh` for a triangle type. Takes effect at the next evaluation.
    fn set_params(
        &mut self,
        type_id: TriangleTypeId,
        k: f64,
        a_mesh: f64,
    ) -> Result<(), EngineError>;

    fn params(&self, type_id: TriangleTypeId) -> Result<TriangleAreaParams, EngineError>;

    /// Evaluates forces, energies and virials of all owned particles and the global mesh
    /// area.
    ///
    /// Under decomposition every partition must call this for the same step, since the
    /// area sum is collective. On error the output holds no partial results.
    fn compute_forces(
        &mut self,
        timestep: u64,
        system: &MeshSystem,
    ) -> Result<&ForceOutput, EngineError>;

    /// Results of the last successful evaluation.
    fn output(&self) -> &ForceOutput;

    /// Global mesh area from the last successful evaluation.
    fn accumulated_area(&self) -> f64 {
        self.output().total_area
    }

    fn is_distributed(&self) -> bool;

    /// Energy change of flipping the shared edge a–b of the triangles (a, b, c) and
    /// (b, a, d) into the edge c–d, using the parameters of `type_id`.
    ///
    /// Pure query: neither the mesh nor the accumulated output is touched.
    fn energy_difference(
        &self,
        system: &MeshSystem,
        tags: [ParticleTag; 4],
        type_id: TriangleTypeId,
    ) -> Result<f64, EngineError> {
        let params = self.params(type_id)?;
        let particles = &system.particles;
        let position = |tag: ParticleTag| {
            particles
                .local_index(tag)
                .and_then(|idx| particles.position(idx))
                .ok_or(EngineError::UnknownParticle(tag))
        };
        let [a, b, c, d] = tags;
        let positions = [position(a)?, position(b)?, position(c)?, position(d)?];
        Ok(quad_flip_energy_difference(positions, &system.pbox, &params))
    }

    fn set_params_by_name(
        &mut self,
        topology: &MeshTopology,
        name: &str,
        k: f64,
        a_mesh: f64,
    ) -> Result<(), EngineError> {
        let type_id = topology
            .type_id(name)
            .ok_or_else(|| EngineError::UnknownTypeName(name.to_string()))?;
        self.set_params(type_id, k, a_mesh)
    }

    fn params_by_name(
        &self,
        topology: &MeshTopology,
        name: &str,
    ) -> Result<TriangleAreaParams, EngineError> {
        let type_id = topology
            .type_id(name)
            .ok_or_else(|| EngineError::UnknownTypeName(name.to_string()))?;
        self.params(type_id)
    }
}

/// Creates the engine selected by `config.backend` for a mesh with `n_types` triangle
/// types.
pub fn create_engine(
    config: &EngineConfig,
    n_types: usize,
    comm: Arc<dyn Communicator>,
) -> Box<dyn ForceEngine> {
    match config.backend {
        Backend::Reference => Box::new(ReferenceEngine::new(config, n_types, comm)),
        Backend::Accelerated => Box::new(AcceleratedEngine::new(config, n_types, comm)),
    }
}

/// State both engines keep: parameters, the partition's communicator and the output
/// buffers.
pub(crate) struct EngineCommon {
    pub params: ParamTable,
    pub comm: Arc<dyn Communicator>,
    pub compute_virial: bool,
    pub output: ForceOutput,
}

impl EngineCommon {
    pub fn new(config: &EngineConfig, n_types: usize, comm: Arc<dyn Communicator>) -> Self {
        Self {
            params: ParamTable::new(n_types),
            comm,
            compute_virial: config.compute_virial,
            output: ForceOutput::default(),
        }
    }

    pub fn set_params(
        &mut self,
        type_id: TriangleTypeId,
        k: f64,
        a_mesh: f64,
    ) -> Result<(), EngineError> {
        self.params.set(type_id, k, a_mesh)?;
        Ok(())
    }

    pub fn params(&self, type_id: TriangleTypeId) -> Result<TriangleAreaParams, EngineError> {
        Ok(self.params.get(type_id)?)
    }

    /// Runs one evaluation body and completes the collective area sum.
    ///
    /// `body` returns the partition's local area share. Every partition joins the
    /// reduction even when its own body failed, together with a fault count, so a fault on
    /// one partition fails the step on all of them instead of leaving peers blocked. The
    /// output holds no partial results after an error.
    pub fn evaluate<F>(&mut self, n_owned: usize, body: F) -> Result<&ForceOutput, EngineError>
    where
        F: FnOnce(&mut Self) -> Result<f64, EngineError>,
    {
        self.output.reset(n_owned);
        let local = body(self);

        let mut totals = match &local {
            Ok(area) => [*area, 0.0],
            Err(_) => [0.0, 1.0],
        };
        let reduced = self.comm.all_reduce_sum(&mut totals);

        let outcome = match (local, reduced) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e.into()),
            (Ok(_), Ok(())) if totals[1] > 0.0 => Err(EngineError::PeerFault {
                partitions: totals[1] as usize,
            }),
            (Ok(_), Ok(())) => {
                self.output.total_area = totals[0];
                Ok(())
            }
        };

        if let Err(e) = outcome {
            self.output.reset(n_owned);
            return Err(e);
        }
        Ok(&self.output)
    }
}
