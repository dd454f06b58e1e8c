use super::gather::Gathered;
use crate::core::forcefield::potentials::{TriangleGeometry, area_share};
use crate::core::models::system::MeshSystem;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Width of the fixed blocks whose partial sums make up the first reduction level.
///
/// Independent of the tuned work-group size, so the summation order and hence the
/// result never depend on tuning.
pub const REDUCTION_WIDTH: usize = 256;

/// This partition's share of the mesh area, before the cross-partition sum.
#[instrument(skip_all, name = "area_pass")]
pub fn run(system: &MeshSystem, gathered: &Gathered, distributed: bool, min_len: usize) -> f64 {
    let partials = partial_sums(system, gathered, distributed, min_len);
    partials.iter().sum()
}

/// First reduction level: one partial sum per block of [`REDUCTION_WIDTH`] triangles.
pub fn partial_sums(
    system: &MeshSystem,
    gathered: &Gathered,
    distributed: bool,
    min_len: usize,
) -> Vec<f64> {
    let positions = system.particles.positions();
    let n_owned = system.particles.n_owned();

    #[cfg(not(feature = "parallel"))]
    let iterator = {
        let _ = min_len;
        gathered.resolved.iter()
    };

    #[cfg(feature = "parallel")]
    let iterator = gathered.resolved.par_iter().with_min_len(min_len);

    let shares: Vec<f64> = iterator
        .map(|&[a, b, c]| {
            let geom =
                TriangleGeometry::new(&positions[a], &positions[b], &positions[c], &system.pbox);
            area_share(geom.area(), [a, b, c].map(|j| j < n_owned), distributed)
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let blocks = shares.chunks(REDUCTION_WIDTH);

    #[cfg(feature = "parallel")]
    let blocks = shares.par_chunks(REDUCTION_WIDTH);

    blocks.map(|block| block.iter().sum::<f64>()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ParticleTag;
    use crate::core::models::particles::ParticleSnapshot;
    use crate::core::models::periodic_box::PeriodicBox;
    use crate::core::models::topology::{MeshTopology, Triangle};
    use crate::engine::tasks::gather;
    use nalgebra::Point3;

    /// A strip of `n` unit right triangles along x.
    fn strip(n: u32) -> MeshSystem {
        let mut particles = Vec::new();
        for i in 0..=n {
            particles.push((ParticleTag(2 * i), Point3::new(i as f64, 0.0, 0.0)));
            particles.push((ParticleTag(2 * i + 1), Point3::new(i as f64, 1.0, 0.0)));
        }
        let triangles = (0..n)
            .map(|i| Triangle::new(2 * i, 2 * i + 2, 2 * i + 1, 0))
            .collect();
        MeshSystem::new(
            MeshTopology::new(vec!["m".into()], triangles).unwrap(),
            ParticleSnapshot::from_owned(&particles).unwrap(),
            PeriodicBox::cubic(4.0 * n as f64 + 10.0),
        )
    }

    #[test]
    fn partial_sums_cover_fixed_width_blocks() {
        let system = strip(600);
        let gathered = gather::run(&system.topology, &system.particles, 1).unwrap();
        let partials = partial_sums(&system, &gathered, false, 1);
        assert_eq!(partials.len(), 3);
        assert_eq!(partials[0], 128.0);
        assert_eq!(partials[2], 44.0);
    }

    #[test]
    fn area_is_independent_of_work_group_size() {
        let system = strip(1000);
        let gathered = gather::run(&system.topology, &system.particles, 1).unwrap();
        let reference = run(&system, &gathered, false, 1);
        for min_len in [32, 64, 1024] {
            assert_eq!(run(&system, &gathered, false, min_len).to_bits(), reference.to_bits());
        }
        assert_eq!(reference, 500.0);
    }
}
