use crate::core::models::ids::{LocalIndex, NOT_LOCAL};
use crate::core::models::particles::ParticleSnapshot;
use crate::core::models::topology::{MeshTopology, Triangle};
use crate::engine::error::TriangleFault;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Local indices of a triangle's vertices, checked against the owned plus ghost range.
#[inline]
pub fn resolve_triangle(
    index: usize,
    triangle: &Triangle,
    particles: &ParticleSnapshot,
) -> Result<[LocalIndex; 3], TriangleFault> {
    let limit = particles.n_local();
    let mut resolved = [0; 3];
    for (slot, &tag) in triangle.tags.iter().enumerate() {
        let raw = particles.rtag(tag);
        if raw == NOT_LOCAL || raw as usize >= limit {
            return Err(TriangleFault {
                triangle: index,
                tag,
                local_index: raw,
                limit,
            });
        }
        resolved[slot] = raw as usize;
    }
    Ok(resolved)
}

/// For every owned particle, the (triangle, vertex slot) pairs that touch it, in
/// triangle order. Stored as compressed rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherTable {
    offsets: Vec<usize>,
    entries: Vec<(usize, u8)>,
}

impl GatherTable {
    pub fn build(resolved: &[[LocalIndex; 3]], n_owned: usize) -> Self {
        let mut offsets = vec![0usize; n_owned + 1];
        for vertices in resolved {
            for &j in vertices.iter().filter(|&&j| j < n_owned) {
                offsets[j + 1] += 1;
            }
        }
        for i in 0..n_owned {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets[..n_owned].to_vec();
        let mut entries = vec![(0, 0); offsets[n_owned]];
        for (t, vertices) in resolved.iter().enumerate() {
            for (slot, &j) in vertices.iter().enumerate() {
                if j < n_owned {
                    entries[cursor[j]] = (t, slot as u8);
                    cursor[j] += 1;
                }
            }
        }

        Self { offsets, entries }
    }

    #[inline]
    pub fn row(&self, particle: LocalIndex) -> &[(usize, u8)] {
        &self.entries[self.offsets[particle]..self.offsets[particle + 1]]
    }

    pub fn n_particles(&self) -> usize {
        self.offsets.len() - 1
    }
}

/// Resolved vertices of every triangle plus the gather table over owned particles.
#[derive(Debug, Clone)]
pub struct Gathered {
    pub resolved: Vec<[LocalIndex; 3]>,
    pub table: GatherTable,
}

/// Resolves all triangles in parallel. On a fault, the fault of the lowest-numbered
/// offending triangle is returned.
pub fn run(
    topology: &MeshTopology,
    particles: &ParticleSnapshot,
    min_len: usize,
) -> Result<Gathered, TriangleFault> {
    #[cfg(not(feature = "parallel"))]
    let iterator = {
        let _ = min_len;
        topology.triangles().iter().enumerate()
    };

    #[cfg(feature = "parallel")]
    let iterator = topology
        .triangles()
        .par_iter()
        .enumerate()
        .with_min_len(min_len);

    let per_triangle: Vec<Result<[LocalIndex; 3], TriangleFault>> = iterator
        .map(|(i, triangle)| resolve_triangle(i, triangle, particles))
        .collect();
    let resolved = per_triangle.into_iter().collect::<Result<Vec<_>, _>>()?;

    let table = GatherTable::build(&resolved, particles.n_owned());
    Ok(Gathered { resolved, table })
}
