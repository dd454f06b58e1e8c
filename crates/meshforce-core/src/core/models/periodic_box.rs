use nalgebra::Vector3;

/// Triclinic periodic simulation box.
///
/// The box is spanned by the lattice vectors
/// `a1 = (Lx, 0, 0)`, `a2 = (xy·Ly, Ly, 0)` and `a3 = (xz·Lz, yz·Lz, Lz)`.
/// Each axis can be made non-periodic, in which case displacements along it
/// are never wrapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    lengths: Vector3<f64>,
    inv_lengths: Vector3<f64>,
    xy: f64,
    xz: f64,
    yz: f64,
    periodic: [bool; 3],
}

impl PeriodicBox {
    /// Creates an orthorhombic box, periodic along every axis.
    pub fn cubic(length: f64) -> Self {
        Self::orthorhombic(length, length, length)
    }

    pub fn orthorhombic(lx: f64, ly: f64, lz: f64) -> Self {
        Self::triclinic(Vector3::new(lx, ly, lz), 0.0, 0.0, 0.0)
    }

    pub fn triclinic(lengths: Vector3<f64>, xy: f64, xz: f64, yz: f64) -> Self {
        let inv = |l: f64| if l > 0.0 { 1.0 / l } else { 0.0 };
        Self {
            lengths,
            inv_lengths: Vector3::new(inv(lengths.x), inv(lengths.y), inv(lengths.z)),
            xy,
            xz,
            yz,
            periodic: [true; 3],
        }
    }

    pub fn with_periodic(mut self, periodic: [bool; 3]) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn lengths(&self) -> Vector3<f64> {
        self.lengths
    }

    pub fn tilts(&self) -> [f64; 3] {
        [self.xy, self.xz, self.yz]
    }

    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    pub fn volume(&self) -> f64 {
        self.lengths.x * self.lengths.y * self.lengths.z
    }

    /// Lattice vector `i` (0, 1 or 2).
    pub fn lattice_vector(&self, i: usize) -> Vector3<f64> {
        let l = self.lengths;
        match i {
            0 => Vector3::new(l.x, 0.0, 0.0),
            1 => Vector3::new(self.xy * l.y, l.y, 0.0),
            _ => Vector3::new(self.xz * l.z, self.yz * l.z, l.z),
        }
    }

    /// Reduces a displacement to its nearest periodic image.
    ///
    /// Axes are reduced z first, then y, then x, because the tilted lattice vectors
    /// carry x (and y) components. Image counts round half to even.
    pub fn min_image(&self, v: Vector3<f64>) -> Vector3<f64> {
        let mut w = v;
        let l = self.lengths;

        if self.periodic[2] {
            let img = (w.z * self.inv_lengths.z).round_ties_even();
            w.z -= l.z * img;
            w.y -= l.z * self.yz * img;
            w.x -= l.z * self.xz * img;
        }

        if self.periodic[1] {
            let img = (w.y * self.inv_lengths.y).round_ties_even();
            w.y -= l.y * img;
            w.x -= l.y * self.xy * img;
        }

        if self.periodic[0] {
            let img = (w.x * self.inv_lengths.x).round_ties_even();
            w.x -= l.x * img;
        }

        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn vec_approx_equal(a: Vector3<f64>, b: Vector3<f64>) -> bool {
        (a - b).norm() < TOLERANCE
    }

    #[test]
    fn min_image_leaves_short_displacements_untouched() {
        let pbox = PeriodicBox::cubic(10.0);
        let v = Vector3::new(1.0, -2.0, 3.0);
        assert!(vec_approx_equal(pbox.min_image(v), v));
    }

    #[test]
    fn min_image_wraps_each_axis_into_half_box() {
        let pbox = PeriodicBox::cubic(10.0);
        let wrapped = pbox.min_image(Vector3::new(6.0, 3.0, -7.0));
        assert!(vec_approx_equal(wrapped, Vector3::new(-4.0, 3.0, 3.0)));
    }

    #[test]
    fn min_image_removes_whole_lattice_translations() {
        let pbox = PeriodicBox::triclinic(Vector3::new(8.0, 9.0, 10.0), 0.2, -0.1, 0.3);
        let v = Vector3::new(0.5, -0.25, 0.75);
        let shifted =
            v + pbox.lattice_vector(0) * 2.0 - pbox.lattice_vector(1) + pbox.lattice_vector(2) * 3.0;
        assert!(vec_approx_equal(pbox.min_image(shifted), v));
    }

    #[test]
    fn non_periodic_axis_is_not_wrapped() {
        let pbox = PeriodicBox::cubic(10.0).with_periodic([true, true, false]);
        let wrapped = pbox.min_image(Vector3::new(9.0, 0.0, 9.0));
        assert!(vec_approx_equal(wrapped, Vector3::new(-1.0, 0.0, 9.0)));
    }

    #[test]
    fn tilted_box_wraps_y_with_x_shear() {
        let pbox = PeriodicBox::triclinic(Vector3::new(10.0, 10.0, 10.0), 0.5, 0.0, 0.0);
        let wrapped = pbox.min_image(Vector3::new(0.0, 6.0, 0.0));
        assert!(vec_approx_equal(wrapped, Vector3::new(-5.0, -4.0, 0.0)));
    }
}
