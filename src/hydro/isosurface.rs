pub mod adjacency;
pub mod cuts;
pub mod freezeout;
pub mod hypercube;
pub mod interpolate;
pub mod record;
pub mod surface;
pub mod tetra;

use serde::{Deserialize, Serialize};

/// Lattice geometry seen by the surface finder. Coordinates of a point are
/// `i * d - size / 2` along every spatial axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub dx: f64,
    pub dy: f64,
    pub deta: f64,
    pub x_size: f64,
    pub y_size: f64,
    pub eta_size: f64,
    pub fac_x: usize,   // stride in x and y
    pub fac_eta: usize, // stride in eta, ignored when boost invariant
    pub boost_invariant: bool,
}

impl Grid {
    /// Stride between the two eta layers of a scanned cell. Boost-invariant
    /// cells are flat in eta.
    pub fn eta_stride(&self) -> usize {
        if self.boost_invariant {
            0
        } else {
            self.fac_eta
        }
    }

    /// Extent [dtau, dx, dy, deta] of one scanned cell.
    pub fn spacing(&self, dtau: f64) -> [f64; 4] {
        let deta = if self.boost_invariant {
            1.0
        } else {
            self.fac_eta as f64 * self.deta
        };
        [
            dtau,
            self.fac_x as f64 * self.dx,
            self.fac_x as f64 * self.dy,
            deta,
        ]
    }

    pub fn x(&self, ix: usize) -> f64 {
        ix as f64 * self.dx - self.x_size / 2.0
    }

    pub fn y(&self, iy: usize) -> f64 {
        iy as f64 * self.dy - self.y_size / 2.0
    }

    /// Space-time rapidity of local layer `ieta` on a rank owning `vz` layers.
    pub fn eta(&self, ieta: usize, vz: usize, rank: usize) -> f64 {
        if self.boost_invariant {
            0.0
        } else {
            self.deta * (ieta + vz * rank) as f64 - self.eta_size / 2.0
        }
    }
}
