use nalgebra::{Point3, Vector3};
use std::ops::{Add, AddAssign};

/// Symmetric virial contribution in lower-triangular packing: xx, xy, xz, yy, yz, zz.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Virial(pub [f64; 6]);

impl Virial {
    /// Half the outer product of a vertex position with the force acting on it.
    #[inline]
    pub fn from_position_force(pos: &Point3<f64>, force: &Vector3<f64>) -> Self {
        Self([
            0.5 * pos.x * force.x,
            0.5 * pos.y * force.x,
            0.5 * pos.z * force.x,
            0.5 * pos.y * force.y,
            0.5 * pos.z * force.y,
            0.5 * pos.z * force.z,
        ])
    }

    #[inline]
    pub fn trace(&self) -> f64 {
        self.0[0] + self.0[3] + self.0[5]
    }
}

impl Add for Virial {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let mut out = self;
        out += rhs;
        out
    }
}

impl AddAssign for Virial {
    fn add_assign(&mut self, rhs: Self) {
        for (lhs, r) in self.0.iter_mut().zip(rhs.0) {
            *lhs += r;
        }
    }
}

/// Accumulated result of one force evaluation on one partition.
///
/// The per-particle arrays cover owned particles only; ghost replicas never receive a
/// write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForceOutput {
    pub forces: Vec<Vector3<f64>>,
    pub energies: Vec<f64>,
    pub virials: Vec<Virial>,
    /// Global mesh area after the cross-partition reduction.
    pub total_area: f64,
}

impl ForceOutput {
    pub fn zeroed(n_owned: usize) -> Self {
        Self {
            forces: vec![Vector3::zeros(); n_owned],
            energies: vec![0.0; n_owned],
            virials: vec![Virial::default(); n_owned],
            total_area: 0.0,
        }
    }

    /// Clears every accumulator and resizes to `n_owned` particles.
    pub fn reset(&mut self, n_owned: usize) {
        self.forces.clear();
        self.forces.resize(n_owned, Vector3::zeros());
        self.energies.clear();
        self.energies.resize(n_owned, 0.0);
        self.virials.clear();
        self.virials.resize(n_owned, Virial::default());
        self.total_area = 0.0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.forces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn total_energy(&self) -> f64 {
        self.energies.iter().sum()
    }

    pub fn net_force(&self) -> Vector3<f64> {
        self.forces.iter().fold(Vector3::zeros(), |acc, f| acc + f)
    }

    pub fn total_virial(&self) -> Virial {
        self.virials
            .iter()
            .fold(Virial::default(), |acc, v| acc + *v)
    }

    pub fn max_force_norm(&self) -> f64 {
        self.forces.iter().map(|f| f.norm()).fold(0.0, f64::max)
    }
}
