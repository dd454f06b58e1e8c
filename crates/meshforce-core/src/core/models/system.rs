use super::periodic_box::PeriodicBox;
use super::particles::ParticleSnapshot;
use super::topology::MeshTopology;

/// Everything a force evaluation reads: the triangles, the particle positions visible
/// to this partition, and the periodic box.
#[derive(Debug, Clone)]
pub struct MeshSystem {
    pub topology: MeshTopology,
    pub particles: ParticleSnapshot,
    pub pbox: PeriodicBox,
}

impl MeshSystem {
    pub fn new(topology: MeshTopology, particles: ParticleSnapshot, pbox: PeriodicBox) -> Self {
        Self {
            topology,
            particles,
            pbox,
        }
    }
}
