use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

use tracing::{debug, info, warn};

use crate::{
    error::{FreezeOutError, Result},
    hydro::{
        eos::EquationOfState,
        field::{FieldStore, Layer},
    },
};

use super::{
    cuts::intersect,
    hypercube::Hypercube,
    interpolate::{fractions, interpolate},
    record::{write_element, SurfaceElement},
    surface::{accumulate, exceeds_faces},
    tetra::{canonical_counts, cell_rng, tetrahedralize},
    Grid,
};

/// Running totals of the non-fatal problems met while building elements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnomalyCounters {
    pub cells: usize,       // elements built
    pub warnings: usize,    // tetrahedron count off the canonical table
    pub weird_cases: usize, // single edges not a multiple of three
    pub topology: usize,    // odd number or more than 12 cuts
    pub face_area: usize,
    pub degenerate: usize,
    pub volume: f64, // sum of |sigma|
}

impl AnomalyCounters {
    pub fn percent_error(&self) -> f64 {
        if self.cells == 0 {
            0.0
        } else {
            100.0 * self.warnings as f64 / self.cells as f64
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PassSummary {
    pub scanned: usize,
    pub intersections: usize,
    pub elements: usize,
    pub volume: f64,
}

/// Opens `surface{rank}.dat` in `dir` for appending.
pub fn open_surface_file(dir: &Path, rank: usize) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(format!("surface{rank}.dat")))?;
    Ok(BufWriter::new(file))
}

pub struct FreezeOutHandler<'a> {
    eos: &'a dyn EquationOfState,
    grid: Grid,
    freezeout_energy: f64, // fm^-4
    bulk: bool,
    pub counters: AnomalyCounters,
}

impl<'a> FreezeOutHandler<'a> {
    pub fn new(
        eos: &'a dyn EquationOfState,
        grid: Grid,
        freezeout_energy: f64,
        bulk: bool,
    ) -> FreezeOutHandler<'a> {
        FreezeOutHandler {
            eos,
            grid,
            freezeout_energy,
            bulk,
            counters: AnomalyCounters::default(),
        }
    }

    /// Scans every cell between the previous and current layers of `store`
    /// and writes one element per crossing. `halo` is the first layer of the
    /// next rank, absent on the last one.
    pub fn find_surfaces<W: Write, const VX: usize, const VY: usize, const VZ: usize>(
        &mut self,
        store: &FieldStore<VX, VY, VZ>,
        halo: Option<&Layer<VX, VY>>,
        writer: &mut W,
    ) -> Result<PassSummary> {
        let fac = self.grid.fac_x.max(1);
        let fac_eta = self.grid.eta_stride();
        let max_eta = if self.grid.boost_invariant {
            1
        } else if halo.is_none() {
            VZ.saturating_sub(fac_eta)
        } else {
            VZ
        };

        let mut summary = PassSummary::default();
        for ix in (0..VX.saturating_sub(fac)).step_by(fac) {
            for iy in (0..VY.saturating_sub(fac)).step_by(fac) {
                for ieta in (0..max_eta).step_by(fac_eta.max(1)) {
                    summary.scanned += 1;
                    let cube = Hypercube::gather(
                        store,
                        halo,
                        &self.grid,
                        self.freezeout_energy,
                        (ix, iy, ieta),
                    );
                    self.counters.degenerate += cube.degenerate;
                    if !cube.crosses(self.freezeout_energy) {
                        continue;
                    }
                    summary.intersections += 1;
                    let element = self.element(store, &cube, (ix, iy, ieta))?;
                    summary.volume += element.sigma.iter().map(|s| s * s).sum::<f64>().sqrt();
                    write_element(writer, &element)?;
                    summary.elements += 1;
                }
            }
        }
        writer.flush()?;

        info!(
            "tau = {:.4} fm: {} cells scanned, {} intersections, {} elements, |sigma| = {:.6e}",
            store.tau, summary.scanned, summary.intersections, summary.elements, summary.volume
        );
        Ok(summary)
    }

    fn element<const VX: usize, const VY: usize, const VZ: usize>(
        &mut self,
        store: &FieldStore<VX, VY, VZ>,
        cube: &Hypercube,
        (ix, iy, ieta): (usize, usize, usize),
    ) -> Result<SurfaceElement> {
        let spacing = self.grid.spacing(store.dtau);
        let crossing = intersect(&cube.values, self.freezeout_energy, spacing);
        let n = crossing.cuts.len();
        if !crossing.is_regular() {
            self.counters.topology += 1;
            warn!(
                "cell ({}, {}, {}) has {} cuts, expected an even number up to 12",
                ix, iy, ieta, n
            );
        }

        // seeded by the global eta index so a split lattice retries like a whole one
        let mut rng = cell_rng(ix, iy, ieta + VZ * store.rank);
        let outcome = tetrahedralize(&crossing.cuts, &mut rng);
        if !outcome.closed {
            debug!(
                "cell ({}, {}, {}): {} cuts closed only by the permissive pass",
                ix, iy, ieta, n
            );
        }
        let sigma = accumulate(&crossing, &outcome.tetrahedra);
        self.counters.cells += 1;
        self.counters.volume += sigma.norm();

        if outcome.single_edges % 3 != 0 {
            self.counters.weird_cases += 1;
            warn!(
                "cell ({}, {}, {}): {} single edges, not a multiple of 3; percent error = {:.3}",
                ix,
                iy,
                ieta,
                outcome.single_edges,
                self.counters.percent_error()
            );
        }
        let count = outcome.tetrahedra.len();
        if let Some(expected) = canonical_counts(n) {
            if !expected.contains(&count) {
                self.counters.warnings += 1;
                warn!(
                    "cell ({}, {}, {}): {} cuts but {} tetrahedra; percent error = {:.3}",
                    ix,
                    iy,
                    ieta,
                    n,
                    count,
                    self.counters.percent_error()
                );
            }
        }
        let oversized = exceeds_faces(&sigma, spacing);
        if !oversized.is_empty() {
            self.counters.face_area += 1;
            warn!(
                "cell ({}, {}, {}): sigma = {:?} exceeds the cell faces in directions {:?}",
                ix,
                iy,
                ieta,
                sigma.as_slice(),
                oversized
            );
        }

        let centroid = crossing.centroid;
        let pos = [
            store.tau - store.dtau + centroid[0],
            self.grid.x(ix) + centroid[1],
            self.grid.y(iy) + centroid[2],
            self.grid.eta(ieta, VZ, store.rank) + centroid[3],
        ];
        if pos[0].is_nan() || pos[0] < 0.0 {
            return Err(FreezeOutError::InvalidProperTime {
                tau: pos[0],
                ix,
                iy,
                ieta,
            });
        }

        let fluid = interpolate(&cube.cells, fractions(&centroid, spacing));
        let e = self.freezeout_energy;
        let temperature = self.eos.temperature(e, fluid.rhob)?;
        if temperature < 0.0 {
            return Err(FreezeOutError::NegativeTemperature {
                temperature,
                ix,
                iy,
                ieta,
            });
        }
        let mu_b = self.eos.chemical_potential(e, fluid.rhob)?;
        let pressure = self.eos.pressure(e, fluid.rhob)?;

        Ok(SurfaceElement {
            pos,
            sigma: [sigma[0], sigma[1], sigma[2], sigma[3]],
            u: fluid.u,
            e,
            temperature,
            mu_b,
            enthalpy_over_t: (e + pressure) / temperature,
            pi: fluid.pi,
            bulk: if self.bulk { Some(fluid.bulk) } else { None },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydro::{eos::conformal::Conformal, field::FieldCell};

    fn grid() -> Grid {
        Grid {
            dx: 0.5,
            dy: 0.5,
            deta: 0.5,
            x_size: 1.0,
            y_size: 1.0,
            eta_size: 1.0,
            fac_x: 1,
            fac_eta: 1,
            boost_invariant: false,
        }
    }

    /// Always answers the same temperature.
    struct Fixed(f64);

    impl EquationOfState for Fixed {
        fn temperature(&self, _e: f64, _rhob: f64) -> Result<f64> {
            Ok(self.0)
        }
        fn chemical_potential(&self, _e: f64, _rhob: f64) -> Result<f64> {
            Ok(0.0)
        }
        fn pressure(&self, e: f64, _rhob: f64) -> Result<f64> {
            Ok(e / 3.0)
        }
    }

    fn cooling_store() -> FieldStore<3, 3, 3> {
        let mut store = FieldStore::<3, 3, 3>::new(1.1, 0.1, 0);
        store.fill(|_, _, _| FieldCell::at_rest(0.1, 1.0));
        store
    }

    #[test]
    fn uniform_cooling_fills_every_cell() {
        let eos = Conformal::qgp();
        let mut handler = FreezeOutHandler::new(&eos, grid(), 0.5, false);
        let mut out = vec![];
        let summary = handler
            .find_surfaces(&cooling_store(), None, &mut out)
            .unwrap();
        // last rank without halo: two eta layers of 2x2 cells
        assert_eq!(summary.scanned, 8);
        assert_eq!(summary.intersections, 8);
        assert_eq!(summary.elements, 8);
        assert!((summary.volume - 8.0 * 0.125).abs() < 1e-9);
        assert_eq!(handler.counters.cells, 8);
        assert_eq!(handler.counters.warnings, 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 8);
    }

    #[test]
    fn hot_store_has_no_surface() {
        let eos = Conformal::qgp();
        let mut handler = FreezeOutHandler::new(&eos, grid(), 0.05, false);
        let mut out = vec![];
        let summary = handler
            .find_surfaces(&cooling_store(), None, &mut out)
            .unwrap();
        assert_eq!(summary.intersections, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn negative_temperature_is_fatal() {
        let eos = Fixed(-1.0);
        let mut handler = FreezeOutHandler::new(&eos, grid(), 0.5, false);
        let err = handler
            .find_surfaces(&cooling_store(), None, &mut Vec::<u8>::new())
            .unwrap_err();
        assert!(matches!(
            err,
            FreezeOutError::NegativeTemperature { ix: 0, iy: 0, ieta: 0, .. }
        ));
    }

    #[test]
    fn negative_proper_time_is_fatal() {
        let eos = Fixed(1.0);
        let mut store = cooling_store();
        store.tau = 0.01;
        let mut handler = FreezeOutHandler::new(&eos, grid(), 0.5, false);
        let err = handler
            .find_surfaces(&store, None, &mut Vec::<u8>::new())
            .unwrap_err();
        assert!(matches!(err, FreezeOutError::InvalidProperTime { .. }));
    }

    #[test]
    fn irregular_crossing_is_counted_and_written() {
        // checkerboard in (tau, x, y): every tau, x and y edge is cut
        let mut store = FieldStore::<2, 2, 1>::new(1.0, 0.1, 0);
        store.fill(|ix, iy, _| {
            let even = (ix + iy) % 2 == 0;
            FieldCell::at_rest(
                if even { 0.0 } else { 1.0 },
                if even { 1.0 } else { 0.0 },
            )
        });
        let grid = Grid {
            fac_eta: 0,
            boost_invariant: true,
            ..grid()
        };
        let eos = Conformal::qgp();
        let mut handler = FreezeOutHandler::new(&eos, grid, 0.5, false);
        let mut out = vec![];
        let summary = handler.find_surfaces(&store, None, &mut out).unwrap();
        assert_eq!(summary.intersections, 1);
        assert_eq!(summary.elements, 1);
        assert_eq!(handler.counters.topology, 1);
        assert_eq!(handler.counters.cells, 1);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        for v in text.split_whitespace() {
            assert!(v.parse::<f64>().unwrap().is_finite());
        }
    }

    #[test]
    fn bulk_column_is_optional() {
        let eos = Fixed(1.0);
        let mut handler = FreezeOutHandler::new(&eos, grid(), 0.5, true);
        let mut out = vec![];
        handler
            .find_surfaces(&cooling_store(), None, &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().all(|l| l.split_whitespace().count() == 27));
    }

    #[test]
    fn surface_file_appends() {
        let dir = std::env::temp_dir().join(format!("implfreezeout-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for _ in 0..2 {
            let mut w = open_surface_file(&dir, 7).unwrap();
            writeln!(w, "line").unwrap();
        }
        let text = std::fs::read_to_string(dir.join("surface7.dat")).unwrap();
        assert_eq!(text.lines().count(), 2);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
