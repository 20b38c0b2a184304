use std::{io::Write, thread};

use tracing::{error, info};

use crate::{
    config::FreezeOutConfig,
    error::{FreezeOutError, Result},
    hydro::{
        eos::EquationOfState,
        exchange::{all_frozen, exchange_boundary, Communicator, SingleProcess, ThreadRanks},
        field::{FieldCell, FieldStore},
        isosurface::freezeout::{open_surface_file, AnomalyCounters, FreezeOutHandler},
        HBARC,
    },
};

use super::SharedEos;

/// Static fireball cooling by longitudinal expansion:
/// `e = e0 (tau0 / tau)^(4/3) exp(-r^2 / 2R^2 - eta^2 / 2 sigma_eta^2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fireball {
    pub e0: f64, // fm^-4
    pub tau0: f64,
    pub radius: f64,
    pub sigma_eta: f64,
}

impl Fireball {
    pub fn from_gev(e0_gev: f64, tau0: f64, radius: f64, sigma_eta: f64) -> Fireball {
        Fireball {
            e0: e0_gev / HBARC,
            tau0,
            radius,
            sigma_eta,
        }
    }

    pub fn energy(&self, tau: f64, x: f64, y: f64, eta: f64) -> f64 {
        let r2 = x * x + y * y;
        let profile = (-r2 / (2.0 * self.radius * self.radius)
            - eta * eta / (2.0 * self.sigma_eta * self.sigma_eta))
            .exp();
        self.e0 * (self.tau0 / tau).powf(4.0 / 3.0) * profile
    }
}

/// Time stepping of a synthetic run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Schedule {
    pub dtau: f64,
    pub tau_end: f64,
}

fn set_energy<const VX: usize, const VY: usize, const VZ: usize>(
    store: &mut FieldStore<VX, VY, VZ>,
    config: &FreezeOutConfig,
    fireball: &Fireball,
) {
    let grid = config.grid();
    let tau = store.tau;
    let rank = store.rank;
    for ieta in 0..VZ {
        for iy in 0..VY {
            for ix in 0..VX {
                let e = fireball.energy(tau, grid.x(ix), grid.y(iy), grid.eta(ieta, VZ, rank));
                store.cell_mut(ix, iy, ieta).e = e;
            }
        }
    }
}

/// Cools the fireball of one rank step by step and extracts the surface
/// after every step, until no rank finds a crossing or `tau_end` is reached.
///
/// On error the other ranks are aborted before the error is returned.
pub fn evolve<C, W, const VX: usize, const VY: usize, const VZ: usize>(
    config: &FreezeOutConfig,
    eos: &dyn EquationOfState,
    fireball: &Fireball,
    schedule: Schedule,
    comm: &C,
    writer: &mut W,
) -> Result<AnomalyCounters>
where
    C: Communicator + ?Sized,
    W: Write,
{
    let res = evolve_rank::<C, W, VX, VY, VZ>(config, eos, fireball, schedule, comm, writer);
    if let Err(e) = &res {
        error!("rank {} stopped: {}", comm.rank(), e);
        comm.abort();
    }
    res
}

fn evolve_rank<C, W, const VX: usize, const VY: usize, const VZ: usize>(
    config: &FreezeOutConfig,
    eos: &dyn EquationOfState,
    fireball: &Fireball,
    schedule: Schedule,
    comm: &C,
    writer: &mut W,
) -> Result<AnomalyCounters>
where
    C: Communicator + ?Sized,
    W: Write,
{
    let freezeout_energy = config.epsilon_fo(eos)?;
    let mut handler = FreezeOutHandler::new(eos, config.grid(), freezeout_energy, config.bulk);

    let mut store = FieldStore::<VX, VY, VZ>::new(fireball.tau0, schedule.dtau, comm.rank());
    store.fill(|_, _, _| FieldCell::at_rest(0.0, 0.0));
    set_energy(&mut store, config, fireball);

    let mut steps = 0;
    while store.tau < schedule.tau_end {
        store.advance(schedule.dtau);
        set_energy(&mut store, config, fireball);
        let halo = exchange_boundary(&store, comm)?;
        let summary = handler.find_surfaces(&store, halo.as_deref(), writer)?;
        steps += 1;
        if all_frozen(comm, summary.intersections)? {
            info!(
                "rank {}: frozen out at tau = {:.4} fm after {} steps",
                comm.rank(),
                store.tau,
                steps
            );
            break;
        }
    }
    Ok(handler.counters)
}

/// Lattice `VX x VY x VZ` handled by a single process.
pub fn run_single<const VX: usize, const VY: usize, const VZ: usize>(
    config: &FreezeOutConfig,
    eos: &dyn EquationOfState,
    fireball: &Fireball,
    schedule: Schedule,
) -> Result<AnomalyCounters> {
    config.write_info(config.epsilon_fo(eos)?, 1)?;
    let mut writer = open_surface_file(&config.output_dir, 0)?;
    evolve::<_, _, VX, VY, VZ>(config, eos, fireball, schedule, &SingleProcess, &mut writer)
}

/// Splits eta over `ranks` threads owning `VZ` layers each.
pub fn run_ranks<const VX: usize, const VY: usize, const VZ: usize>(
    config: &FreezeOutConfig,
    eos: SharedEos,
    fireball: &Fireball,
    schedule: Schedule,
    ranks: usize,
) -> Result<Vec<AnomalyCounters>> {
    config.write_info(config.epsilon_fo(eos.as_ref())?, ranks)?;
    let handles: Vec<_> = ThreadRanks::mesh(ranks)
        .into_iter()
        .map(|comm| {
            let config = config.clone();
            let eos = eos.clone();
            let fireball = *fireball;
            thread::spawn(move || -> Result<AnomalyCounters> {
                let mut writer = match open_surface_file(&config.output_dir, comm.rank()) {
                    Ok(w) => w,
                    Err(e) => {
                        comm.abort();
                        return Err(e);
                    }
                };
                evolve::<_, _, VX, VY, VZ>(
                    &config,
                    eos.as_ref(),
                    &fireball,
                    schedule,
                    &comm,
                    &mut writer,
                )
            })
        })
        .collect();

    handles
        .into_iter()
        .enumerate()
        .map(|(rank, h)| {
            h.join().map_err(|_| FreezeOutError::Exchange {
                rank,
                reason: "rank thread panicked".to_string(),
            })?
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Criterion,
        hydro::{eos::conformal::Conformal, isosurface::record::read_surface},
    };
    use approx::assert_relative_eq;

    fn config() -> FreezeOutConfig {
        FreezeOutConfig {
            freezeout: Criterion::Energy { epsilon_gev: 0.5 },
            dx: 0.5,
            dy: 0.5,
            deta: 0.5,
            x_size: 4.0,
            y_size: 4.0,
            eta_size: 4.0,
            boost_invariant: true,
            ..FreezeOutConfig::default()
        }
    }

    #[test]
    fn fireball_cools_as_bjorken() {
        let f = Fireball::from_gev(10.0, 0.6, 2.0, 1.5);
        assert_relative_eq!(f.energy(0.6, 0.0, 0.0, 0.0), 10.0 / HBARC);
        assert_relative_eq!(
            f.energy(4.8, 0.0, 0.0, 0.0),
            10.0 / HBARC / 16.0,
            max_relative = 1e-12
        );
        assert!(f.energy(0.6, 2.0, 0.0, 0.0) < f.energy(0.6, 1.0, 0.0, 0.0));
    }

    #[test]
    fn boost_invariant_fireball_freezes_out() {
        let eos = Conformal::qgp();
        let fireball = Fireball::from_gev(2.0, 0.6, 1.0, 1.0);
        let schedule = Schedule {
            dtau: 0.2,
            tau_end: 20.0,
        };
        let mut out = vec![];
        let counters = evolve::<_, _, 9, 9, 1>(
            &config(),
            &eos,
            &fireball,
            schedule,
            &SingleProcess,
            &mut out,
        )
        .unwrap();
        let elements = read_surface(&out[..], false).unwrap();
        assert!(!elements.is_empty());
        assert_eq!(elements.len(), counters.cells);
        for s in elements.iter() {
            assert!((s.u[0] - 1.0).abs() < 1e-12);
            assert!(s.u[1..].iter().all(|u| u.abs() < 1e-12));
            // the boost-invariant slab spans one unit of eta
            assert!((s.pos[3] - 0.5).abs() < 1e-12);
            assert!(s.temperature > 0.0);
        }
    }

    /// Temperature below zero everywhere.
    struct Cold;

    impl EquationOfState for Cold {
        fn temperature(&self, _e: f64, _rhob: f64) -> Result<f64> {
            Ok(-1.0)
        }
        fn chemical_potential(&self, _e: f64, _rhob: f64) -> Result<f64> {
            Ok(0.0)
        }
        fn pressure(&self, e: f64, _rhob: f64) -> Result<f64> {
            Ok(e / 3.0)
        }
    }

    #[test]
    fn failing_rank_stops_the_others() {
        let config = FreezeOutConfig {
            boost_invariant: false,
            eta_size: 0.5 * 11.0,
            ..config()
        };
        let fireball = Fireball::from_gev(2.0, 0.6, 1.0, 1.0);
        let schedule = Schedule {
            dtau: 0.2,
            tau_end: 20.0,
        };
        let handles: Vec<_> = ThreadRanks::mesh(3)
            .into_iter()
            .map(|comm| {
                let config = config.clone();
                thread::spawn(move || {
                    let conformal = Conformal::qgp();
                    let eos: &dyn EquationOfState = if comm.rank() == 1 {
                        &Cold
                    } else {
                        &conformal
                    };
                    let res = evolve::<_, _, 9, 9, 4>(
                        &config,
                        eos,
                        &fireball,
                        schedule,
                        &comm,
                        &mut Vec::<u8>::new(),
                    );
                    (comm.rank(), res)
                })
            })
            .collect();
        for h in handles {
            let (rank, res) = h.join().unwrap();
            match rank {
                1 => assert!(matches!(
                    res,
                    Err(FreezeOutError::NegativeTemperature { .. })
                )),
                _ => assert!(matches!(res, Err(FreezeOutError::Exchange { .. }))),
            }
        }
    }
}
