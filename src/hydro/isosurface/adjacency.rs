//! Static topology of the hypercube spanned by one lattice cell.
//!
//! Corners are numbered layer by layer. A layer is one (tau, eta) pair and
//! walks the transverse square counter-clockwise:
//!
//! ```text
//!   3 ---- 2      layer 0:  corners  0..4   tau - dtau, eta
//!   |      |      layer 1:  corners  4..8   tau,        eta
//!   |      |      layer 2:  corners  8..12  tau - dtau, eta + deta
//!   0 ---- 1      layer 3:  corners 12..16  tau,        eta + deta
//!  y
//!  ^
//!  +--> x
//! ```
//!
//! Edges 0..12 span the eta layer of the cell (transverse edges of layers 0
//! and 1, then the tau edges between them), edges 12..24 repeat that pattern
//! one eta step higher, and edges 24..32 are the eta edges.

use lazy_static::lazy_static;

pub const TAU: usize = 0;
pub const X: usize = 1;
pub const Y: usize = 2;
pub const ETA: usize = 3;

pub const EDGES: [(usize, usize); 32] = [
    (0, 1),
    (1, 2),
    (3, 2),
    (0, 3),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
    (4, 5),
    (5, 6),
    (7, 6),
    (4, 7),
    (8, 9),
    (9, 10),
    (11, 10),
    (8, 11),
    (8, 12),
    (9, 13),
    (10, 14),
    (11, 15),
    (12, 13),
    (13, 14),
    (15, 14),
    (12, 15),
    (0, 8),
    (1, 9),
    (2, 10),
    (3, 11),
    (4, 12),
    (5, 13),
    (6, 14),
    (7, 15),
];

const TRANSVERSE: [(usize, usize); 4] = [(0, 0), (1, 0), (1, 1), (0, 1)];

/// Unit coordinates [tau, x, y, eta] of a corner.
pub fn corner_unit(c: usize) -> [usize; 4] {
    let (x, y) = TRANSVERSE[c % 4];
    [(c % 8) / 4, x, y, c / 8]
}

/// Corner on the other end of the main diagonal through `c`.
pub fn antipode(c: usize) -> usize {
    let [t, _, _, e] = corner_unit(c);
    (1 - e) * 8 + (1 - t) * 4 + (c + 2) % 4
}

/// Axis along which an edge runs.
pub fn edge_axis(e: usize) -> usize {
    let (k, l) = EDGES[e];
    let (a, b) = (corner_unit(k), corner_unit(l));
    (0..4).find(|&i| a[i] != b[i]).unwrap_or(TAU)
}

/// How two edges of the hypercube are related.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Unrelated,
    /// The edges meet at a corner.
    SharedFace,
    /// The edges are opposite sides of one square.
    OppositeOnFace,
    SharedCube,
    OppositeOnCube,
}

impl Relation {
    /// Cuts on such edges lie on a common square and are joined by an edge
    /// of the crossing polytope.
    pub fn is_neighbor(&self) -> bool {
        matches!(self, Relation::SharedFace | Relation::OppositeOnFace)
    }
}

#[rustfmt::skip]
const ADJACENCY: [[u8; 32]; 32] = [
    [0, 1, 2, 1, 1, 1, 3, 3, 2, 3, 4, 3, 2, 3, 4, 3, 3, 3, 0, 0, 4, 0, 0, 0, 1, 1, 3, 3, 3, 3, 0, 0],
    [1, 0, 1, 2, 3, 1, 1, 3, 3, 2, 3, 4, 3, 2, 3, 4, 3, 3, 0, 0, 0, 4, 0, 0, 3, 1, 1, 3, 0, 3, 3, 0],
    [2, 1, 0, 1, 3, 3, 1, 1, 4, 3, 2, 3, 4, 3, 2, 3, 0, 0, 3, 3, 0, 0, 4, 0, 3, 3, 1, 1, 0, 0, 3, 3],
    [1, 2, 1, 0, 1, 3, 3, 1, 3, 4, 3, 2, 3, 4, 3, 2, 3, 0, 0, 3, 0, 4, 0, 0, 1, 3, 3, 1, 3, 0, 0, 3],
    [1, 3, 3, 1, 0, 2, 4, 2, 1, 3, 3, 1, 3, 0, 0, 3, 2, 4, 0, 4, 3, 0, 0, 3, 1, 3, 0, 3, 1, 3, 0, 3],
    [1, 1, 3, 3, 2, 0, 2, 4, 1, 1, 3, 3, 3, 3, 0, 0, 4, 2, 4, 0, 3, 3, 0, 0, 3, 1, 3, 0, 3, 1, 3, 0],
    [3, 1, 1, 3, 4, 2, 0, 2, 3, 1, 1, 3, 0, 3, 3, 0, 0, 4, 2, 4, 0, 3, 3, 0, 0, 3, 1, 3, 0, 3, 1, 3],
    [3, 3, 1, 1, 2, 4, 2, 0, 3, 3, 1, 1, 0, 0, 3, 3, 4, 0, 4, 2, 0, 0, 3, 3, 3, 0, 3, 1, 3, 0, 3, 1],
    [2, 3, 4, 3, 1, 1, 3, 3, 0, 1, 2, 1, 4, 0, 0, 0, 3, 3, 0, 0, 2, 3, 4, 3, 3, 3, 0, 0, 1, 1, 3, 3],
    [3, 2, 3, 4, 3, 1, 1, 3, 1, 0, 1, 2, 0, 4, 0, 0, 0, 3, 3, 0, 3, 2, 3, 4, 0, 3, 3, 0, 3, 1, 1, 3],
    [4, 3, 2, 3, 3, 3, 1, 1, 2, 1, 0, 1, 0, 0, 4, 0, 0, 0, 3, 3, 4, 3, 2, 3, 0, 0, 3, 3, 3, 3, 1, 1],
    [3, 4, 3, 2, 1, 3, 3, 1, 1, 2, 1, 0, 0, 0, 0, 4, 3, 0, 0, 3, 3, 4, 3, 2, 3, 0, 0, 3, 1, 3, 3, 1],
    [2, 3, 4, 3, 3, 3, 0, 0, 4, 0, 0, 0, 0, 1, 2, 1, 1, 1, 3, 3, 2, 3, 4, 3, 1, 1, 3, 3, 3, 3, 0, 0],
    [3, 2, 3, 4, 0, 3, 3, 0, 0, 4, 0, 0, 1, 0, 1, 2, 3, 1, 1, 3, 3, 2, 3, 4, 3, 1, 1, 3, 0, 3, 3, 0],
    [4, 3, 2, 3, 0, 0, 3, 3, 0, 0, 4, 0, 2, 1, 0, 1, 3, 3, 1, 1, 4, 3, 2, 3, 3, 3, 1, 1, 0, 0, 3, 3],
    [3, 4, 3, 2, 3, 0, 0, 3, 0, 0, 0, 4, 1, 2, 1, 0, 1, 3, 3, 1, 3, 4, 3, 2, 1, 3, 3, 1, 3, 0, 0, 3],
    [3, 0, 0, 3, 2, 4, 0, 4, 3, 0, 0, 3, 1, 3, 3, 1, 0, 2, 4, 2, 1, 3, 3, 1, 1, 3, 0, 3, 1, 3, 0, 3],
    [3, 3, 0, 0, 4, 2, 4, 0, 3, 3, 0, 0, 1, 1, 3, 3, 2, 0, 2, 4, 1, 1, 3, 3, 3, 1, 3, 0, 3, 1, 3, 0],
    [0, 3, 3, 0, 0, 4, 2, 4, 0, 3, 3, 0, 3, 1, 1, 3, 4, 2, 0, 2, 3, 1, 1, 3, 0, 3, 1, 3, 0, 3, 1, 3],
    [0, 0, 3, 3, 4, 0, 4, 2, 0, 0, 3, 3, 3, 3, 1, 1, 2, 4, 2, 0, 3, 3, 1, 1, 3, 0, 3, 1, 3, 0, 3, 1],
    [4, 0, 0, 0, 3, 3, 0, 0, 2, 3, 4, 3, 2, 3, 4, 3, 1, 1, 3, 3, 0, 1, 2, 1, 3, 3, 0, 0, 1, 1, 3, 3],
    [0, 4, 0, 0, 0, 3, 3, 0, 3, 2, 3, 4, 3, 2, 3, 4, 3, 1, 1, 3, 1, 0, 1, 2, 0, 3, 3, 0, 3, 1, 1, 3],
    [0, 0, 4, 0, 0, 0, 3, 3, 4, 3, 2, 3, 4, 3, 2, 3, 3, 3, 1, 1, 2, 1, 0, 1, 0, 0, 3, 3, 3, 3, 1, 1],
    [0, 0, 0, 4, 3, 0, 0, 3, 3, 4, 3, 2, 3, 4, 3, 2, 1, 3, 3, 1, 1, 2, 1, 0, 3, 0, 0, 3, 1, 3, 3, 1],
    [1, 3, 3, 1, 1, 3, 0, 3, 3, 0, 0, 3, 1, 3, 3, 1, 1, 3, 0, 3, 3, 0, 0, 3, 0, 2, 4, 2, 2, 4, 0, 4],
    [1, 1, 3, 3, 3, 1, 3, 0, 3, 3, 0, 0, 1, 1, 3, 3, 3, 1, 3, 0, 3, 3, 0, 0, 2, 0, 2, 4, 4, 2, 4, 0],
    [3, 1, 1, 3, 0, 3, 1, 3, 0, 3, 3, 0, 3, 1, 1, 3, 0, 3, 1, 3, 0, 3, 3, 0, 4, 2, 0, 2, 0, 4, 2, 4],
    [3, 3, 1, 1, 3, 0, 3, 1, 0, 0, 3, 3, 3, 3, 1, 1, 3, 0, 3, 1, 0, 0, 3, 3, 2, 4, 2, 0, 4, 0, 4, 2],
    [3, 0, 0, 3, 1, 3, 0, 3, 1, 3, 3, 1, 3, 0, 0, 3, 1, 3, 0, 3, 1, 3, 3, 1, 2, 4, 0, 4, 0, 2, 4, 2],
    [3, 3, 0, 0, 3, 1, 3, 0, 1, 1, 3, 3, 3, 3, 0, 0, 3, 1, 3, 0, 1, 1, 3, 3, 4, 2, 4, 0, 2, 0, 2, 4],
    [0, 3, 3, 0, 0, 3, 1, 3, 3, 1, 1, 3, 0, 3, 3, 0, 0, 3, 1, 3, 3, 1, 1, 3, 0, 4, 2, 4, 4, 2, 0, 2],
    [0, 0, 3, 3, 3, 0, 3, 1, 3, 3, 1, 1, 0, 0, 3, 3, 3, 0, 3, 1, 3, 3, 1, 1, 4, 0, 4, 2, 2, 4, 2, 0],
];

pub fn relation(a: usize, b: usize) -> Relation {
    match ADJACENCY[a][b] {
        0 => Relation::Unrelated,
        1 => Relation::SharedFace,
        2 => Relation::OppositeOnFace,
        3 => Relation::SharedCube,
        _ => Relation::OppositeOnCube,
    }
}

lazy_static! {
    /// Bit `2 * axis + side` is set when the edge lies in the facet where
    /// `axis` is fixed to `side`.
    static ref EDGE_FACETS: [u8; 32] = {
        let mut masks = [0u8; 32];
        for (e, &(k, l)) in EDGES.iter().enumerate() {
            let (a, b) = (corner_unit(k), corner_unit(l));
            for axis in 0..4 {
                if a[axis] == b[axis] {
                    masks[e] |= 1 << (2 * axis + a[axis]);
                }
            }
        }
        masks
    };
}

/// Facets of the hypercube containing edge `e`.
pub fn facets(e: usize) -> u8 {
    EDGE_FACETS[e]
}
