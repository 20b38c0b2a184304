use std::path::Path;

use tracing::info;

use crate::{
    config::FreezeOutConfig,
    error::Result,
    hydro::{
        eos::EquationOfState,
        field::{FieldCell, FieldStore},
        isosurface::freezeout::{open_surface_file, FreezeOutHandler, PassSummary},
        utils::load_matrix_2d,
        HBARC,
    },
};

/// Boost-invariant store at rest built from two energy-density slices given
/// in GeV/fm^3.
pub fn store_from_slices<const VX: usize, const VY: usize>(
    previous: &[[f64; VX]; VY],
    current: &[[f64; VX]; VY],
    tau: f64,
    dtau: f64,
) -> FieldStore<VX, VY, 1> {
    let mut store = FieldStore::<VX, VY, 1>::new(tau, dtau, 0);
    store.fill(|ix, iy, _| {
        FieldCell::at_rest(current[iy][ix] / HBARC, previous[iy][ix] / HBARC)
    });
    store
}

/// Extracts the surface between two slices stored as whitespace matrices
/// (rows along y).
pub fn run<const VX: usize, const VY: usize>(
    config: &FreezeOutConfig,
    eos: &dyn EquationOfState,
    previous: &Path,
    current: &Path,
    tau: f64,
    dtau: f64,
) -> Result<PassSummary> {
    let prev = load_matrix_2d::<VX, VY>(previous)?;
    let cur = load_matrix_2d::<VX, VY>(current)?;
    let store = store_from_slices(&prev, &cur, tau, dtau);

    let config = FreezeOutConfig {
        boost_invariant: true,
        ..config.clone()
    };
    let freezeout_energy = config.epsilon_fo(eos)?;
    config.write_info(freezeout_energy, 1)?;
    let mut handler = FreezeOutHandler::new(eos, config.grid(), freezeout_energy, config.bulk);
    let mut writer = open_surface_file(&config.output_dir, 0)?;
    let summary = handler.find_surfaces(&store, None, &mut writer)?;
    info!(
        "{} elements between tau = {} fm and {} fm, percent error = {:.3}",
        summary.elements,
        tau - dtau,
        tau,
        handler.counters.percent_error()
    );
    Ok(summary)
}
