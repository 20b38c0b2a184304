use boxarray::boxarray;

/// Independent shear-stress components, ordered
/// [tautau, taux, tauy, taueta, xx, xy, xeta, yy, yeta, etaeta].
pub const SHEAR: usize = 10;

/// Physical state of one lattice point at the current and previous layers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldCell {
    pub e: f64,
    pub e_prev: f64,
    pub u: [f64; 4], // [utau, ux, uy, ueta]
    pub u_prev: [f64; 4],
    pub pi: [f64; SHEAR],
    pub pi_prev: [f64; SHEAR],
    pub rhob: f64,
    pub bulk: f64,
    pub bulk_prev: f64,
}

impl FieldCell {
    /// Fluid at rest without dissipative corrections.
    pub fn at_rest(e: f64, e_prev: f64) -> FieldCell {
        FieldCell {
            e,
            e_prev,
            u: [1.0, 0.0, 0.0, 0.0],
            u_prev: [1.0, 0.0, 0.0, 0.0],
            ..FieldCell::default()
        }
    }
}

pub type Layer<const VX: usize, const VY: usize> = [[FieldCell; VX]; VY];

/// Copy of the first eta layer of the next rank.
pub type Halo<const VX: usize, const VY: usize> = Box<Layer<VX, VY>>;

pub fn empty_layer<const VX: usize, const VY: usize>() -> Halo<VX, VY> {
    boxarray(FieldCell::default())
}

/// Lattice owned by one rank: `VX` by `VY` points in the transverse plane and
/// `VZ` eta layers, indexed `[ieta][iy][ix]`.
pub struct FieldStore<const VX: usize, const VY: usize, const VZ: usize> {
    pub cells: Box<[[[FieldCell; VX]; VY]; VZ]>,
    pub tau: f64,  // time of the current layer
    pub dtau: f64, // distance to the previous layer
    pub rank: usize,
}

impl<const VX: usize, const VY: usize, const VZ: usize> FieldStore<VX, VY, VZ> {
    pub fn new(tau: f64, dtau: f64, rank: usize) -> FieldStore<VX, VY, VZ> {
        FieldStore {
            cells: boxarray(FieldCell::default()),
            tau,
            dtau,
            rank,
        }
    }

    pub fn cell(&self, ix: usize, iy: usize, ieta: usize) -> &FieldCell {
        &self.cells[ieta][iy][ix]
    }

    pub fn cell_mut(&mut self, ix: usize, iy: usize, ieta: usize) -> &mut FieldCell {
        &mut self.cells[ieta][iy][ix]
    }

    pub fn layer(&self, ieta: usize) -> &Layer<VX, VY> {
        &self.cells[ieta]
    }

    pub fn fill(&mut self, f: impl Fn(usize, usize, usize) -> FieldCell) {
        for ieta in 0..VZ {
            for iy in 0..VY {
                for ix in 0..VX {
                    self.cells[ieta][iy][ix] = f(ix, iy, ieta);
                }
            }
        }
    }

    /// Moves the current layer into the previous one and advances the time.
    pub fn advance(&mut self, dtau: f64) {
        for layer in self.cells.iter_mut() {
            for row in layer.iter_mut() {
                for c in row.iter_mut() {
                    c.e_prev = c.e;
                    c.u_prev = c.u;
                    c.pi_prev = c.pi;
                    c.bulk_prev = c.bulk;
                }
            }
        }
        self.tau += dtau;
        self.dtau = dtau;
    }
}
