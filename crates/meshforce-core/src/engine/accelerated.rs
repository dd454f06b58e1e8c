use super::backend::{EngineCommon, ForceEngine};
use super::comm::Communicator;
use super::config::{Backend, EngineConfig};
use super::error::EngineError;
use super::tasks::{area_pass, coefficients, force_pass, gather};
use super::tuner::Autotuner;
use crate::core::forcefield::params::TriangleAreaParams;
use crate::core::forcefield::term::ForceOutput;
use crate::core::models::ids::TriangleTypeId;
use crate::core::models::system::MeshSystem;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Data-parallel force engine.
///
/// A step runs three kernels on the rayon pool: vertex resolution with fault
/// detection, the force pass and the area pass. The force and area passes are each
/// launched with the work-group size picked by their own [`Autotuner`]; resolution
/// shares the force pass's size.
pub struct AcceleratedEngine {
    common: EngineCommon,
    force_tuner: Autotuner,
    area_tuner: Autotuner,
}

impl AcceleratedEngine {
    pub fn new(config: &EngineConfig, n_types: usize, comm: Arc<dyn Communicator>) -> Self {
        Self {
            common: EngineCommon::new(config, n_types, comm),
            force_tuner: Autotuner::new("area_conservation_forces", config.tuner.clone()),
            area_tuner: Autotuner::new("area_conservation_area", config.tuner.clone()),
        }
    }

    pub fn force_tuner(&self) -> &Autotuner {
        &self.force_tuner
    }

    pub fn area_tuner(&self) -> &Autotuner {
        &self.area_tuner
    }
}

impl ForceEngine for AcceleratedEngine {
    fn backend(&self) -> Backend {
        Backend::Accelerated
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

    #[instrument(skip_all, name = "accelerated_compute_forces", fields(timestep = timestep))]
    fn compute_forces(
        &mut self,
        timestep: u64,
        system: &MeshSystem,
    ) -> Result<&ForceOutput, EngineError> {
        let Self {
            common,
            force_tuner,
            area_tuner,
        } = self;

        common.evaluate(system.particles.n_owned(), |common| {
            let coeffs = coefficients::resolve(&common.params, &system.topology)?;

            let block = force_tuner.begin();
            let gathered = gather::run(&system.topology, &system.particles, block);
            let gathered = match gathered {
                Ok(g) => g,
                Err(fault) => {
                    force_tuner.end();
                    return Err(fault.into());
                }
            };
            force_pass::run(
                system,
                &gathered,
                &coeffs,
                common.compute_virial,
                &mut common.output,
                block,
            );
            force_tuner.end();

            let block = area_tuner.begin();
            let local_area = area_pass::run(system, &gathered, common.comm.is_distributed(), block);
            area_tuner.end();

            debug!(
                local_area,
                force_block = force_tuner.param(),
                area_block = area_tuner.param(),
                "Accelerated evaluation finished"
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
