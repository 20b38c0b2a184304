use tracing::debug;

use crate::hydro::field::{FieldCell, FieldStore, Layer};

use super::{
    adjacency::{antipode, corner_unit},
    Grid,
};

/// Offset added to a corner sitting exactly on the threshold.
pub const DEGENERACY_SHIFT: f64 = 1e-6;

/// The 16 energy-density samples of one space-time cell and the 8 lattice
/// points they come from.
///
/// `cells[s]` is the point at transverse corner `s % 4` and eta layer `s / 4`;
/// corner `c` of the hypercube reads the previous or current energy density of
/// `cells[c % 4 + 4 * (c / 8)]`.
#[derive(Clone, Debug)]
pub struct Hypercube {
    pub values: [f64; 16],
    pub cells: [FieldCell; 8],
    /// Corners shifted off the threshold.
    pub degenerate: usize,
}

impl Hypercube {
    /// Samples the cell with lower corner (ix, iy, ieta). The upper eta layer
    /// comes from `halo` once it lies beyond the owned layers.
    pub fn gather<const VX: usize, const VY: usize, const VZ: usize>(
        store: &FieldStore<VX, VY, VZ>,
        halo: Option<&Layer<VX, VY>>,
        grid: &Grid,
        threshold: f64,
        (ix, iy, ieta): (usize, usize, usize),
    ) -> Hypercube {
        let fac = grid.fac_x;
        let upper = ieta + grid.eta_stride();
        let mut cells = [FieldCell::default(); 8];
        for (s, cell) in cells.iter_mut().enumerate() {
            let [_, x, y, _] = corner_unit(s % 4);
            let (jx, jy) = (ix + x * fac, iy + y * fac);
            *cell = if s < 4 {
                *store.cell(jx, jy, ieta)
            } else {
                match halo {
                    Some(layer) if upper >= VZ => layer[jy][jx],
                    _ => *store.cell(jx, jy, upper.min(VZ - 1)),
                }
            };
        }

        let mut values = [0.0; 16];
        let mut degenerate = 0;
        for (c, v) in values.iter_mut().enumerate() {
            let cell = &cells[c % 4 + 4 * (c / 8)];
            *v = if corner_unit(c)[0] == 1 {
                cell.e
            } else {
                cell.e_prev
            };
            if *v == threshold {
                *v += DEGENERACY_SHIFT;
                degenerate += 1;
            }
        }
        if degenerate > 0 {
            debug!(
                "shifted {} corners of cell ({}, {}, {}) off the threshold",
                degenerate, ix, iy, ieta
            );
        }

        Hypercube {
            values,
            cells,
            degenerate,
        }
    }

    /// False when every main diagonal stays on one side of the threshold.
    pub fn crosses(&self, threshold: f64) -> bool {
        (0..8).any(|c| {
            let a = self.values[c];
            let b = self.values[antipode(c)];
            (threshold - a) * (threshold - b) < 0.0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid {
            dx: 1.0,
            dy: 1.0,
            deta: 1.0,
            x_size: 0.0,
            y_size: 0.0,
            eta_size: 0.0,
            fac_x: 1,
            fac_eta: 1,
            boost_invariant: false,
        }
    }

    fn store() -> FieldStore<2, 2, 2> {
        let mut store = FieldStore::<2, 2, 2>::new(1.0, 0.1, 0);
        store.fill(|ix, iy, ieta| {
            FieldCell::at_rest(
                (ix + 2 * iy + 4 * ieta) as f64,
                -((ix + 2 * iy + 4 * ieta) as f64),
            )
        });
        store
    }

    #[test]
    fn corners_follow_the_numbering() {
        let h = Hypercube::gather(&store(), None, &grid(), 100.0, (0, 0, 0));
        // transverse order 0:(0,0) 1:(1,0) 2:(1,1) 3:(0,1)
        assert_eq!(&h.values[0..4], &[0.0, -1.0, -3.0, -2.0]);
        assert_eq!(&h.values[4..8], &[0.0, 1.0, 3.0, 2.0]);
        assert_eq!(&h.values[8..12], &[-4.0, -5.0, -7.0, -6.0]);
        assert_eq!(&h.values[12..16], &[4.0, 5.0, 7.0, 6.0]);
    }

    #[test]
    fn upper_layer_comes_from_the_halo() {
        let store = FieldStore::<2, 2, 1>::new(1.0, 0.1, 0);
        let mut halo = *crate::hydro::field::empty_layer::<2, 2>();
        halo[1][1].e = 9.0;
        let h = Hypercube::gather(&store, Some(&halo), &grid(), 1.0, (0, 0, 0));
        assert_eq!(h.values[14], 9.0);
        assert_eq!(h.values[6], 0.0);
    }

    #[test]
    fn boost_invariant_copies_the_layer() {
        let g = Grid {
            boost_invariant: true,
            fac_eta: 0,
            ..grid()
        };
        let h = Hypercube::gather(&store(), None, &g, 100.0, (0, 0, 0));
        assert_eq!(&h.values[0..8], &h.values[8..16]);
    }

    #[test]
    fn uniform_cube_does_not_cross() {
        let mut store = FieldStore::<2, 2, 2>::new(1.0, 0.1, 0);
        store.fill(|_, _, _| FieldCell::at_rest(0.9, 0.7));
        let h = Hypercube::gather(&store, None, &grid(), 0.5, (0, 0, 0));
        assert!(!h.crosses(0.5));
        assert!(h.crosses(0.8));
    }

    #[test]
    fn threshold_corners_are_shifted() {
        let mut store = FieldStore::<2, 2, 2>::new(1.0, 0.1, 0);
        store.fill(|_, _, _| FieldCell::at_rest(0.0, 0.0));
        store.cell_mut(1, 1, 1).e = 0.5;
        let h = Hypercube::gather(&store, None, &grid(), 0.5, (0, 0, 0));
        assert_eq!(h.degenerate, 1);
        assert_eq!(h.values[14], 0.5 + DEGENERACY_SHIFT);
        assert_eq!(store.cell(1, 1, 1).e, 0.5);
        assert!(h.crosses(0.5));
    }
}
