use nalgebra::Vector4;

use super::adjacency::{corner_unit, edge_axis, EDGES};

/// Point where the threshold crosses edge `edge`, relative to the lower
/// corner of the cell, in [tau, x, y, eta].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cut {
    pub edge: usize,
    pub pos: Vector4<f64>,
}

/// Crossing of one hypercube.
#[derive(Clone, Debug)]
pub struct Intersection {
    pub cuts: Vec<Cut>,
    /// Points from the side above the threshold towards the side below.
    pub bias: Vector4<f64>,
    pub centroid: Vector4<f64>,
}

impl Intersection {
    /// At least one cut, an even number of them and no more than 12.
    pub fn is_regular(&self) -> bool {
        let n = self.cuts.len();
        n > 0 && n % 2 == 0 && n <= 12
    }
}

/// Interpolates the crossing point on every edge straddling `threshold`.
pub fn intersect(values: &[f64; 16], threshold: f64, spacing: [f64; 4]) -> Intersection {
    let mut cuts = Vec::with_capacity(12);
    for (edge, &(k, l)) in EDGES.iter().enumerate() {
        let (ek, el) = (values[k], values[l]);
        let (dek, del) = (threshold - ek, threshold - el);
        if dek * del < 0.0 {
            let unit = corner_unit(k);
            let mut pos = Vector4::from_fn(|i, _| unit[i] as f64 * spacing[i]);
            let axis = edge_axis(edge);
            pos[axis] += dek / (el - ek) * spacing[axis];
            cuts.push(Cut { edge, pos });
        }
    }

    let mut lower_sum = 0.0;
    let mut higher_sum = 0.0;
    let mut lower = Vector4::zeros();
    let mut higher = Vector4::zeros();
    for (c, &v) in values.iter().enumerate() {
        let d = threshold - v;
        let unit = Vector4::from_fn(|i, _| corner_unit(c)[i] as f64);
        if d > 0.0 {
            lower_sum += d.abs();
            lower += unit * d.abs();
        } else {
            higher_sum += d.abs();
            higher += unit * d.abs();
        }
    }
    if lower_sum > 0.0 {
        lower /= lower_sum;
    }
    if higher_sum > 0.0 {
        higher /= higher_sum;
    }
    let scale = Vector4::from(spacing);
    let bias = (lower - higher).component_mul(&scale);

    let centroid = if cuts.is_empty() {
        Vector4::zeros()
    } else {
        cuts.iter().map(|c| c.pos).sum::<Vector4<f64>>() / cuts.len() as f64
    };

    Intersection {
        cuts,
        bias,
        centroid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Cooling in tau only: current layer at `cur`, previous at `prev`.
    fn cooling(prev: f64, cur: f64) -> [f64; 16] {
        let mut v = [0.0; 16];
        for (c, x) in v.iter_mut().enumerate() {
            *x = if corner_unit(c)[0] == 1 { cur } else { prev };
        }
        v
    }

    #[test]
    fn tau_edges_are_cut_at_the_interpolated_time() {
        let i = intersect(&cooling(1.0, 0.0), 0.25, [0.1, 1.0, 1.0, 1.0]);
        assert_eq!(i.cuts.len(), 8);
        assert!(i.is_regular());
        for c in i.cuts.iter() {
            assert_eq!(edge_axis(c.edge), 0);
            assert_relative_eq!(c.pos[0], 0.075, epsilon = 1e-12);
        }
        assert_relative_eq!(i.centroid, Vector4::new(0.075, 0.5, 0.5, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn bias_points_to_the_cold_side() {
        let i = intersect(&cooling(1.0, 0.0), 0.25, [0.1, 1.0, 1.0, 1.0]);
        // cold corners sit at the later time
        assert!(i.bias[0] > 0.0);
        assert_relative_eq!(i.bias[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(i.bias[1], 0.0, epsilon = 1e-12);

        let i = intersect(&cooling(0.0, 1.0), 0.25, [0.1, 1.0, 1.0, 1.0]);
        assert_relative_eq!(i.bias[0], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn no_crossing_no_cuts() {
        let i = intersect(&cooling(1.0, 0.9), 0.25, [0.1, 1.0, 1.0, 1.0]);
        assert!(i.cuts.is_empty());
        assert!(!i.is_regular());
        assert_eq!(i.centroid, Vector4::zeros());
    }
}
