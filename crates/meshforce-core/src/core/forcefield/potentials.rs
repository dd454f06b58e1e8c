use super::params::TriangleAreaParams;
use crate::core::models::periodic_box::PeriodicBox;
use nalgebra::{Point3, Vector3};

/// Edge vectors and derived products of one triangle (a, b, c), with both edges taken
/// from vertex `a` under the minimum-image convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleGeometry {
    pub dab: Vector3<f64>,
    pub dac: Vector3<f64>,
    pub rsqab: f64,
    pub rsqac: f64,
    pub rabrac: f64,
    /// Twice the triangle area, `|dab × dac|`.
    pub area2: f64,
}

impl TriangleGeometry {
    pub fn new(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, pbox: &PeriodicBox) -> Self {
        let dab = pbox.min_image(b - a);
        let dac = pbox.min_image(c - a);
        Self::from_edges(dab, dac)
    }

    pub fn from_edges(dab: Vector3<f64>, dac: Vector3<f64>) -> Self {
        let rsqab = dab.dot(&dab);
        let rsqac = dac.dot(&dac);
        let rabrac = dab.dot(&dac);

        // Cauchy-Schwarz keeps this non-negative; cancellation can still leave a tiny
        // negative residue for near-degenerate triangles.
        let radicand = (rsqab * rsqac - rabrac * rabrac).max(0.0);

        Self {
            dab,
            dac,
            rsqab,
            rsqac,
            rabrac,
            area2: radicand.sqrt(),
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.area2 / 2.0
    }
}

/// Area-conservation contribution of one triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaConservationTerm {
    /// Energy credited to each of the three vertices, `K/(6·A_t)·(A − A_t)²`.
    pub vertex_energy: f64,
    /// Forces on vertices a, b and c.
    pub forces: [Vector3<f64>; 3],
}

impl AreaConservationTerm {
    /// Energy of the whole triangle, `K/(2·A_t)·(A − A_t)²`.
    #[inline]
    pub fn energy(&self) -> f64 {
        3.0 * self.vertex_energy
    }
}

/// Energy and vertex forces of the potential `E = K/(2·A_t)·(A − A_t)²`.
///
/// A degenerate triangle (zero area) has no defined area gradient and receives zero
/// forces; its energy is still reported.
#[inline]
pub fn triangle_area_conservation(
    geom: &TriangleGeometry,
    k: f64,
    target_area: f64,
) -> AreaConservationTerm {
    let deviation = geom.area2 / 2.0 - target_area;
    let vertex_energy = k / (6.0 * target_area) * deviation * deviation;

    if geom.area2 <= 0.0 {
        return AreaConservationTerm {
            vertex_energy,
            forces: [Vector3::zeros(); 3],
        };
    }

    let prefactor = -k / (2.0 * target_area * geom.area2) * deviation;
    let TriangleGeometry {
        dab,
        dac,
        rsqab,
        rsqac,
        rabrac,
        ..
    } = *geom;

    let fa = prefactor * ((rabrac - rsqac) * dab + (rabrac - rsqab) * dac);
    let fb = prefactor * (rsqac * dab - rabrac * dac);
    let fc = prefactor * (rsqab * dac - rabrac * dab);

    AreaConservationTerm {
        vertex_energy,
        forces: [fa, fb, fc],
    }
}

/// Portion of a triangle's area this partition contributes to the global sum.
///
/// Without decomposition every triangle is counted once. Under decomposition a triangle
/// is present on each partition owning one of its vertices, so each owned vertex
/// contributes a third and the global sum counts the triangle exactly once.
#[inline]
pub fn area_share(area: f64, owned: [bool; 3], distributed: bool) -> f64 {
    if !distributed {
        return area;
    }
    let n_owned = owned.iter().filter(|&&o| o).count();
    area / 3.0 * n_owned as f64
}

/// Areas of the two triangulations of a quad (a, b, c, d) sharing edge a–b.
///
/// The current triangles are (a, b, c) and (a, b, d); the flipped ones are (a, c, d)
/// and (d, c, b). Areas come from pairwise lengths and the enclosed angle, not from the
/// kernel's cross-product form, because the two triangulations do not share edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadFlipAreas {
    pub current: [f64; 2],
    pub flipped: [f64; 2],
}

impl QuadFlipAreas {
    pub fn new(positions: [&Point3<f64>; 4], pbox: &PeriodicBox) -> Self {
        let [a, b, c, d] = positions;

        let dab = pbox.min_image(b - a);
        let dac = pbox.min_image(c - a);
        let dbd = pbox.min_image(d - b);
        let ddc = pbox.min_image(c - d);

        let rab = dab.norm();
        let rac = dac.norm();
        let rbd = dbd.norm();
        let rdc = ddc.norm();

        let nab = unit(dab, rab);
        let nac = unit(dac, rac);
        let nbd = unit(dbd, rbd);
        let ndc = unit(ddc, rdc);

        let c_baac = clamped_cosine(nab.dot(&nac));
        let c_abbd = clamped_cosine(-nab.dot(&nbd));
        let c_dcca = clamped_cosine(ndc.dot(&nac));
        let c_bddc = clamped_cosine(-ndc.dot(&nbd));

        Self {
            current: [
                angle_area(rab, rac, c_baac),
                angle_area(rab, rbd, c_abbd),
            ],
            flipped: [
                angle_area(rac, rdc, c_dcca),
                angle_area(rdc, rbd, c_bddc),
            ],
        }
    }

    /// `K/(2·A_mesh)·Σ[(A_new − A_mesh)² − (A_old − A_mesh)²]`.
    pub fn energy_difference(&self, params: &TriangleAreaParams) -> f64 {
        let a_mesh = params.a_mesh;
        let penalty = |area: f64| (area - a_mesh) * (area - a_mesh);
        let new: f64 = self.flipped.iter().map(|&a| penalty(a)).sum();
        let old: f64 = self.current.iter().map(|&a| penalty(a)).sum();
        params.k / (2.0 * a_mesh) * (new - old)
    }
}

/// Energy change of flipping the diagonal of quad (a, b, c, d) from a–b to c–d.
pub fn quad_flip_energy_difference(
    positions: [&Point3<f64>; 4],
    pbox: &PeriodicBox,
    params: &TriangleAreaParams,
) -> f64 {
    QuadFlipAreas::new(positions, pbox).energy_difference(params)
}

#[inline]
fn unit(v: Vector3<f64>, len: f64) -> Vector3<f64> {
    if len > 0.0 { v / len } else { Vector3::zeros() }
}

#[inline]
fn clamped_cosine(c: f64) -> f64 {
    c.clamp(-1.0, 1.0)
}

#[inline]
fn angle_area(r1: f64, r2: f64, cosine: f64) -> f64 {
    let sine = (1.0 - cosine * cosine).max(0.0).sqrt();
    r1 * r2 * sine / 2.0
}
