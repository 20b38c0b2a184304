use nalgebra::{Matrix3, Vector4};

use super::{cuts::Intersection, tetra::Tetrahedron};

/// Slack allowed on the face areas of a cell.
pub const FACE_TOLERANCE: f64 = 0.01;

/// Normal vector of the tetrahedron spanned by three cuts and the centroid,
/// scaled by its 3-volume, with lower indices [tau, x, y, eta].
pub fn tetra_normal(
    a: &Vector4<f64>,
    b: &Vector4<f64>,
    c: &Vector4<f64>,
    centroid: &Vector4<f64>,
) -> Vector4<f64> {
    let rows = [a - b, a - c, centroid - a];
    let minor = |skip: usize| {
        let cols: Vec<usize> = (0..4).filter(|&k| k != skip).collect();
        Matrix3::from_fn(|r, k| rows[r][cols[k]]).determinant()
    };
    Vector4::new(minor(0), -minor(1), minor(2), -minor(3)) / 6.0
}

/// Sums the tetrahedra of a crossing, turning every component of each one
/// towards the side below the threshold.
pub fn accumulate(intersection: &Intersection, tetrahedra: &[Tetrahedron]) -> Vector4<f64> {
    let cuts = &intersection.cuts;
    let bias = &intersection.bias;
    tetrahedra
        .iter()
        .map(|t| {
            let [a, b, c] = t.cuts;
            let mut s = tetra_normal(
                &cuts[a].pos,
                &cuts[b].pos,
                &cuts[c].pos,
                &intersection.centroid,
            );
            for k in 0..4 {
                if s[k] * bias[k] < 0.0 {
                    s[k] = -s[k];
                }
            }
            s
        })
        .sum()
}

/// Components larger than the cell face orthogonal to them.
pub fn exceeds_faces(sigma: &Vector4<f64>, spacing: [f64; 4]) -> Vec<usize> {
    let [dtau, dx, dy, deta] = spacing;
    let faces = [dx * dy * deta, dtau * dy * deta, dx * dtau * deta, dx * dy * dtau];
    (0..4)
        .filter(|&k| sigma[k].abs() > faces[k] + FACE_TOLERANCE)
        .collect()
}
