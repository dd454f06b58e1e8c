use crate::core::models::ids::{ParticleTag, TriangleTypeId};
use crate::core::models::system::MeshSystem;
use crate::core::models::topology::{EdgeKey, MeshTopology, Triangle, edge_key};
use crate::engine::backend::ForceEngine;
use crate::engine::config::FlipConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct FlipReport {
    pub sweeps: usize,
    /// Flips whose energy difference was evaluated.
    pub attempted: u64,
    pub accepted: u64,
    pub energy_before: f64,
    pub energy_after: f64,
    pub area_before: f64,
    pub area_after: f64,
}

/// The quad around an interior edge a–b: triangle `first` is (a, b, c) and triangle
/// `second` is (b, a, d), both up to rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FlipProposal {
    a: ParticleTag,
    b: ParticleTag,
    c: ParticleTag,
    d: ParticleTag,
    first: usize,
    second: usize,
    type_id: TriangleTypeId,
}

impl FlipProposal {
    fn tags(&self) -> [ParticleTag; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// Triangles after the flip, (a, d, c) and (d, b, c), oriented like the originals.
    fn flipped(&self) -> (Triangle, Triangle) {
        (
            Triangle {
                tags: [self.a, self.d, self.c],
                type_id: self.type_id,
            },
            Triangle {
                tags: [self.d, self.b, self.c],
                type_id: self.type_id,
            },
        )
    }
}

type EdgeMap = HashMap<EdgeKey, Vec<usize>>;

/// Builds the flip of edge `key`, or `None` if the edge cannot be flipped: boundary and
/// non-manifold edges, quads with inconsistent orientation, mixed-type quads and flips
/// that would duplicate an existing edge.
fn propose(topology: &MeshTopology, edges: &EdgeMap, key: EdgeKey) -> Option<FlipProposal> {
    let &[first, second] = edges.get(&key)?.as_slice() else {
        return None;
    };
    let t1 = topology.triangles().get(first)?;
    let t2 = topology.triangles().get(second)?;
    if t1.type_id != t2.type_id {
        return None;
    }

    let (u, v) = key;
    let (a, b) = if t1.has_directed_edge(u, v) { (u, v) } else { (v, u) };
    if !t1.has_directed_edge(a, b) || !t2.has_directed_edge(b, a) {
        return None;
    }

    let c = t1.opposite(a, b)?;
    let d = t2.opposite(a, b)?;
    if c == d || edges.contains_key(&edge_key(c, d)) {
        return None;
    }

    Some(FlipProposal {
        a,
        b,
        c,
        d,
        first,
        second,
        type_id: t1.type_id,
    })
}

fn reassign(edges: &mut EdgeMap, key: EdgeKey, from: usize, to: usize) {
    if let Some(triangles) = edges.get_mut(&key) {
        for t in triangles.iter_mut().filter(|t| **t == from) {
            *t = to;
        }
    }
}

fn apply(
    topology: &mut MeshTopology,
    edges: &mut EdgeMap,
    p: &FlipProposal,
) -> Result<(), EngineError> {
    let (new_first, new_second) = p.flipped();
    topology.replace_pair((p.first, new_first), (p.second, new_second))?;

    edges.remove(&edge_key(p.a, p.b));
    edges.insert(edge_key(p.c, p.d), vec![p.first, p.second]);
    reassign(edges, edge_key(p.a, p.d), p.second, p.first);
    reassign(edges, edge_key(p.b, p.c), p.first, p.second);
    Ok(())
}

/// Runs Metropolis edge-flip sweeps over the interior edges of the mesh.
///
/// Each sweep visits the edges that were interior at its start, in tag order. A flip is
/// accepted when `exp(-ΔE / T)` exceeds a uniform draw from `[0, 1)`. Accepted flips
/// rewrite the two triangles in place, so the triangle count and per-type counts never
/// change.
#[instrument(skip_all, name = "flip_workflow")]
pub fn run(
    system: &mut MeshSystem,
    engine: &mut dyn ForceEngine,
    config: &FlipConfig,
    reporter: &ProgressReporter,
) -> Result<FlipReport, EngineError> {
    if engine.is_distributed() {
        return Err(EngineError::DistributedFlip);
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let before = engine.compute_forces(0, system)?;
    let (energy_before, area_before) = (before.total_energy(), before.total_area);

    let mut edges = system.topology.edge_map();
    let (mut attempted, mut accepted) = (0u64, 0u64);

    for sweep in 0..config.sweeps {
        let mut keys: Vec<EdgeKey> = edges
            .iter()
            .filter(|(_, triangles)| triangles.len() == 2)
            .map(|(key, _)| *key)
            .collect();
        keys.sort_unstable();

        reporter.report(Progress::SweepStart {
            index: sweep,
            total_edges: keys.len() as u64,
        });

        let mut accepted_in_sweep = 0u64;
        for key in keys {
            let Some(proposal) = propose(&system.topology, &edges, key) else {
                continue;
            };
            let delta = engine.energy_difference(system, proposal.tags(), proposal.type_id)?;
            attempted += 1;

            let draw: f64 = rng.r#gen();
            let accept = (-delta / config.temperature).exp() > draw;
            if accept {
                apply(&mut system.topology, &mut edges, &proposal)?;
                accepted_in_sweep += 1;
            }
            reporter.report(Progress::EdgeAttempted { accepted: accept });
        }

        accepted += accepted_in_sweep;
        debug!(sweep, accepted = accepted_in_sweep, "Sweep finished");
        reporter.report(Progress::SweepFinish {
            accepted: accepted_in_sweep,
        });
    }

    let after = engine.compute_forces(config.sweeps as u64, system)?;
    let report = FlipReport {
        sweeps: config.sweeps,
        attempted,
        accepted,
        energy_before,
        energy_after: after.total_energy(),
        area_before,
        area_after: after.total_area,
    };
    info!(
        attempted = report.attempted,
        accepted = report.accepted,
        "Edge-flip sweeps finished"
    );
    Ok(report)
}
