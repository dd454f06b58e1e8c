use crate::core::forcefield::params::ParamTable;
use crate::core::forcefield::term::Virial;
use crate::core::models::ids::TriangleTypeId;
use crate::core::models::system::MeshSystem;
use crate::engine::backend::{ForceEngine, create_engine};
use crate::engine::comm::Communicator;
use crate::engine::config::{Backend, EngineConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Vector3;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub backend: Backend,
    pub steps: u64,
    /// Global mesh area.
    pub total_area: f64,
    /// Potential energy of the particles owned by this partition.
    pub total_energy: f64,
    pub net_force: Vector3<f64>,
    pub max_force: f64,
    pub virial: Virial,
}

/// Copies every configured type of `params` into the engine.
pub fn load_params(engine: &mut dyn ForceEngine, params: &ParamTable) -> Result<(), EngineError> {
    for i in 0..params.n_types() {
        let type_id = TriangleTypeId(i);
        if let Ok(p) = params.get(type_id) {
            engine.set_params(type_id, p.k, p.a_mesh)?;
        }
    }
    Ok(())
}

/// Evaluates the mesh `steps` times (at least once) and summarizes the last evaluation.
#[instrument(skip_all, name = "evaluate_workflow")]
pub fn run(
    system: &MeshSystem,
    params: &ParamTable,
    config: &EngineConfig,
    steps: u64,
    comm: Arc<dyn Communicator>,
    reporter: &ProgressReporter,
) -> Result<EvaluationReport, EngineError> {
    let mut engine = create_engine(config, system.topology.n_types(), comm);
    load_params(engine.as_mut(), params)?;

    let steps = steps.max(1);
    info!(
        backend = %config.backend,
        steps,
        triangles = system.topology.len(),
        particles = system.particles.n_owned(),
        "Evaluating mesh"
    );

    for timestep in 0..steps {
        let output = engine.compute_forces(timestep, system)?;
        reporter.report(Progress::EvaluationFinished {
            timestep,
            total_area: output.total_area,
        });
    }

    let output = engine.output();
    let report = EvaluationReport {
        backend: engine.backend(),
        steps,
        total_area: output.total_area,
        total_energy: output.total_energy(),
        net_force: output.net_force(),
        max_force: output.max_force_norm(),
        virial: output.total_virial(),
    };
    info!(
        total_area = report.total_area,
        total_energy = report.total_energy,
        "Evaluation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ParticleTag;
    use crate::core::models::particles::ParticleSnapshot;
    use crate::core::models::periodic_box::PeriodicBox;
    use crate::core::models::topology::{MeshTopology, Triangle};
    use crate::engine::comm::SerialCommunicator;
    use crate::engine::config::EngineConfigBuilder;
    use nalgebra::Point3;
    use parking_lot::Mutex;

    fn right_triangle() -> (MeshSystem, ParamTable) {
        let particles = ParticleSnapshot::from_owned(&[
            (ParticleTag(0), Point3::new(0.0, 0.0, 0.0)),
            (ParticleTag(1), Point3::new(2.0, 0.0, 0.0)),
            (ParticleTag(2), Point3::new(0.0, 2.0, 0.0)),
        ])
        .unwrap();
        let topology =
            MeshTopology::new(vec!["m".into()], vec![Triangle::new(0, 1, 2, 0)]).unwrap();
        let mut params = ParamTable::new(1);
        params.set(TriangleTypeId(0), 4.0, 1.0).unwrap();
        (
            MeshSystem::new(topology, particles, PeriodicBox::cubic(10.0)),
            params,
        )
    }

    #[test]
    fn run_reports_area_energy_and_balanced_forces() {
        let (system, params) = right_triangle();
        for backend in [Backend::Reference, Backend::Accelerated] {
            let config = EngineConfigBuilder::new().backend(backend).build().unwrap();
            let report = run(
                &system,
                &params,
                &config,
                3,
                Arc::new(SerialCommunicator),
                &ProgressReporter::new(),
            )
            .unwrap();
            assert_eq!(report.backend, backend);
            assert_eq!(report.steps, 3);
            assert!((report.total_area - 2.0).abs() < 1e-12);
            assert!((report.total_energy - 2.0).abs() < 1e-12);
            assert!(report.net_force.norm() < 1e-12);
            assert!(report.max_force > 0.0);
        }
    }

    #[test]
    fn run_reports_one_event_per_step() {
        let (system, params) = right_triangle();
        let config = EngineConfigBuilder::new()
            .backend(Backend::Reference)
            .build()
            .unwrap();
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e| events.lock().push(e)));
        run(&system, &params, &config, 2, Arc::new(SerialCommunicator), &reporter).unwrap();
        drop(reporter);
        let events = events.into_inner();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Progress::EvaluationFinished { timestep: 1, .. }));
    }

    #[test]
    fn run_fails_when_a_used_type_has_no_params() {
        let (system, _) = right_triangle();
        let config = EngineConfigBuilder::new()
            .backend(Backend::Accelerated)
            .build()
            .unwrap();
        let result = run(
            &system,
            &ParamTable::new(1),
            &config,
            1,
            Arc::new(SerialCommunicator),
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::MissingParams(_))));
    }
}
