use nalgebra::Vector4;

use crate::hydro::field::{FieldCell, SHEAR};

/// Fluid state at the centroid of a crossing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interpolated {
    pub u: [f64; 4],
    pub pi: [f64; SHEAR],
    pub bulk: f64,
    pub rhob: f64,
}

/// Position of `centroid` inside the cell as fractions [tau, x, y, eta] of
/// the cell extent.
pub fn fractions(centroid: &Vector4<f64>, spacing: [f64; 4]) -> [f64; 4] {
    [0, 1, 2, 3].map(|k| centroid[k] / spacing[k])
}

/// Trilinear blend over the 8 spatial points of a cell, indexed like
/// `Hypercube::cells`.
fn spatial(
    cells: &[FieldCell; 8],
    [_, fx, fy, feta]: [f64; 4],
    f: impl Fn(&FieldCell) -> f64,
) -> f64 {
    let layer = |o: usize| {
        let low = (1.0 - fx) * f(&cells[o]) + fx * f(&cells[o + 1]);
        let high = (1.0 - fx) * f(&cells[o + 3]) + fx * f(&cells[o + 2]);
        (1.0 - fy) * low + fy * high
    };
    (1.0 - feta) * layer(0) + feta * layer(4)
}

/// Blends the two time layers of a trilinear interpolation.
fn quadrilinear(
    cells: &[FieldCell; 8],
    frac: [f64; 4],
    current: impl Fn(&FieldCell) -> f64,
    previous: impl Fn(&FieldCell) -> f64,
) -> f64 {
    let ftau = frac[0];
    (1.0 - ftau) * spatial(cells, frac, previous) + ftau * spatial(cells, frac, current)
}

pub fn interpolate(cells: &[FieldCell; 8], frac: [f64; 4]) -> Interpolated {
    let u = [0, 1, 2, 3].map(|i| quadrilinear(cells, frac, |c| c.u[i], |c| c.u_prev[i]));
    let mut pi = [0.0; SHEAR];
    for (i, p) in pi.iter_mut().enumerate() {
        *p = quadrilinear(cells, frac, |c| c.pi[i], |c| c.pi_prev[i]);
    }
    Interpolated {
        u,
        pi,
        bulk: quadrilinear(cells, frac, |c| c.bulk, |c| c.bulk_prev),
        rhob: spatial(cells, frac, |c| c.rhob),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Cells of a field linear in every direction.
    fn linear_cells() -> [FieldCell; 8] {
        let offsets = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let mut cells = [FieldCell::default(); 8];
        for (s, c) in cells.iter_mut().enumerate() {
            let (x, y) = offsets[s % 4];
            let eta = (s / 4) as f64;
            c.u = [1.0, x, 2.0 * y, 3.0 * eta];
            c.u_prev = [1.0, 0.0, 0.0, 0.0];
            c.pi[4] = x + y + eta;
            c.pi_prev[4] = x + y + eta - 1.0;
            c.bulk = 10.0;
            c.rhob = x * y;
        }
        cells
    }

    #[test]
    fn fractions_scale_by_the_spacing() {
        let f = fractions(&Vector4::new(0.05, 0.5, 0.25, 0.0), [0.1, 1.0, 0.5, 2.0]);
        assert_relative_eq!(f[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(f[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(f[2], 0.5, epsilon = 1e-12);
        assert_relative_eq!(f[3], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn linear_fields_are_reproduced() {
        let i = interpolate(&linear_cells(), [1.0, 0.25, 0.5, 0.75]);
        assert_relative_eq!(i.u[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(i.u[1], 0.25, epsilon = 1e-12);
        assert_relative_eq!(i.u[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(i.u[3], 2.25, epsilon = 1e-12);
        assert_relative_eq!(i.pi[4], 1.5, epsilon = 1e-12);
        assert_relative_eq!(i.rhob, 0.125, epsilon = 1e-12);
    }

    #[test]
    fn time_fraction_blends_the_layers() {
        let i = interpolate(&linear_cells(), [0.5, 0.25, 0.5, 0.75]);
        assert_relative_eq!(i.u[1], 0.125, epsilon = 1e-12);
        assert_relative_eq!(i.pi[4], 1.0, epsilon = 1e-12);
        assert_relative_eq!(i.bulk, 5.0, epsilon = 1e-12);
        // baryon density has no previous layer
        assert_relative_eq!(i.rhob, 0.125, epsilon = 1e-12);
    }
}
