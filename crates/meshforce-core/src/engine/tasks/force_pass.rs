use super::coefficients::TypeCoefficients;
use super::gather::Gathered;
use crate::core::forcefield::potentials::{
    AreaConservationTerm, TriangleGeometry, triangle_area_conservation,
};
use crate::core::forcefield::term::{ForceOutput, Virial};
use crate::core::models::system::MeshSystem;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Evaluates every triangle, then lets each owned particle sum the contributions of the
/// triangles it belongs to.
///
/// Each particle is written by exactly one work item, and its contributions are summed
/// in triangle order, which is the order the reference engine uses.
#[instrument(skip_all, name = "force_pass")]
pub fn run(
    system: &MeshSystem,
    gathered: &Gathered,
    coefficients: &[TypeCoefficients],
    compute_virial: bool,
    output: &mut ForceOutput,
    min_len: usize,
) {
    let positions = system.particles.positions();
    let triangles = system.topology.triangles();

    #[cfg(not(feature = "parallel"))]
    let iterator = gathered.resolved.iter().zip(triangles.iter());

    #[cfg(feature = "parallel")]
    let iterator = gathered
        .resolved
        .par_iter()
        .zip(triangles.par_iter())
        .with_min_len(min_len);

    let terms: Vec<AreaConservationTerm> = iterator
        .map(|(&[a, b, c], triangle)| {
            let geom =
                TriangleGeometry::new(&positions[a], &positions[b], &positions[c], &system.pbox);
            let coeff = coefficients[triangle.type_id.index()];
            triangle_area_conservation(&geom, coeff.k, coeff.target_area)
        })
        .collect();

    let ForceOutput {
        forces,
        energies,
        virials,
        ..
    } = output;

    #[cfg(not(feature = "parallel"))]
    let accumulators = {
        let _ = min_len;
        forces
            .iter_mut()
            .zip(energies.iter_mut())
            .zip(virials.iter_mut())
            .enumerate()
    };

    #[cfg(feature = "parallel")]
    let accumulators = forces
        .par_iter_mut()
        .zip(energies.par_iter_mut())
        .zip(virials.par_iter_mut())
        .enumerate()
        .with_min_len(min_len);

    accumulators.for_each(|(j, ((force, energy), virial))| {
        for &(t, slot) in gathered.table.row(j) {
            let term = &terms[t];
            let f = term.forces[slot as usize];
            *force += f;
            *energy += term.vertex_energy;
            if compute_virial {
                *virial += Virial::from_position_force(&positions[j], &f);
            }
        }
    });
}
