use std::{path::PathBuf, process, thread};

use clap::{Parser, Subcommand};
use implfreezeout::{
    config::{Criterion, FreezeOutConfig},
    error::Result,
    hydro::{eos::EOSs, isosurface::freezeout::AnomalyCounters},
    run::{
        load_eos, snapshot,
        synthetic::{self, Fireball, Schedule},
    },
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Eta layers owned by each rank of a 3D synthetic run.
const ETA_LAYERS: usize = 10;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Lattice points along x and y.
    #[arg(short, long, default_value_t = 40)]
    cells: usize,

    /// YAML run configuration; the options below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Freeze-out energy density [GeV/fm^3].
    #[arg(long, conflicts_with = "temperature")]
    epsilon: Option<f64>,

    /// Freeze-out temperature [GeV].
    #[arg(long)]
    temperature: Option<f64>,

    #[arg(long, value_enum, default_value_t = EOSs::Conformal)]
    eos: EOSs,

    /// Table with the columns e [GeV/fm^3], P [GeV/fm^3], T [GeV].
    #[arg(long)]
    eos_table: Option<PathBuf>,

    /// Append the bulk pressure to every surface element.
    #[arg(long, default_value_t = false)]
    bulk: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Freeze-out of an analytic fireball cooling in proper time.
    Synthetic {
        #[arg(long, default_value_t = 10.0)] // GeV/fm^3
        e0: f64,
        #[arg(long, default_value_t = 0.6)]
        tau0: f64,
        #[arg(long, default_value_t = 3.0)]
        radius: f64,
        #[arg(long, default_value_t = 2.0)]
        sigma_eta: f64,
        #[arg(long, default_value_t = 0.1)]
        dtau: f64,
        #[arg(long, default_value_t = 30.0)]
        tau_end: f64,
        #[arg(short, long, default_value_t = 20.0)]
        physical_length: f64,
        /// Resolve eta instead of assuming boost invariance.
        #[arg(long, default_value_t = false)]
        three_d: bool,
        /// Ranks sharing the eta direction (3D only).
        #[arg(short, long, default_value_t = 1)]
        ranks: usize,
    },
    /// Freeze-out between two boost-invariant energy-density slices.
    Snapshot {
        previous: PathBuf,
        current: PathBuf,
        #[arg(long)]
        tau: f64,
        #[arg(long)]
        dtau: f64,
    },
}

fn configure(cli: &Cli) -> Result<FreezeOutConfig> {
    let mut config = match &cli.config {
        Some(path) => FreezeOutConfig::load(path)?,
        None => FreezeOutConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(epsilon_gev) = cli.epsilon {
        config.freezeout = Criterion::Energy { epsilon_gev };
    }
    if let Some(temperature_gev) = cli.temperature {
        config.freezeout = Criterion::Temperature { temperature_gev };
    }
    config.bulk |= cli.bulk;
    config.validate()?;
    Ok(config)
}

fn report(counters: &[AnomalyCounters]) {
    let cells: usize = counters.iter().map(|c| c.cells).sum();
    let warnings: usize = counters.iter().map(|c| c.warnings).sum();
    let weird: usize = counters.iter().map(|c| c.weird_cases).sum();
    let volume: f64 = counters.iter().map(|c| c.volume).sum();
    let percent = if cells == 0 {
        0.0
    } else {
        100.0 * warnings as f64 / cells as f64
    };
    info!(
        "{} elements, |sigma| = {:.6e}, {} tetrahedra warnings ({:.3}%), {} weird cases",
        cells, volume, warnings, percent, weird
    );
}

fn run<const CELLS: usize>(cli: Cli) -> Result<()> {
    let mut config = configure(&cli)?;
    let eos = load_eos(cli.eos, cli.eos_table.as_deref())?;
    match cli.command {
        Command::Synthetic {
            e0,
            tau0,
            radius,
            sigma_eta,
            dtau,
            tau_end,
            physical_length,
            three_d,
            ranks,
        } => {
            let dx = physical_length / CELLS as f64;
            config.dx = dx;
            config.dy = dx;
            config.x_size = dx * (CELLS - 1) as f64;
            config.y_size = config.x_size;
            config.boost_invariant = !three_d;
            let fireball = Fireball::from_gev(e0, tau0, radius, sigma_eta);
            let schedule = Schedule { dtau, tau_end };
            let counters = if three_d {
                config.eta_size = config.deta * (ETA_LAYERS * ranks.max(1) - 1) as f64;
                synthetic::run_ranks::<CELLS, CELLS, ETA_LAYERS>(
                    &config,
                    eos,
                    &fireball,
                    schedule,
                    ranks.max(1),
                )?
            } else {
                vec![synthetic::run_single::<CELLS, CELLS, 1>(
                    &config,
                    eos.as_ref(),
                    &fireball,
                    schedule,
                )?]
            };
            report(&counters);
        }
        Command::Snapshot {
            previous,
            current,
            tau,
            dtau,
        } => {
            config.x_size = config.dx * (CELLS - 1) as f64;
            config.y_size = config.dy * (CELLS - 1) as f64;
            snapshot::run::<CELLS, CELLS>(&config, eos.as_ref(), &previous, &current, tau, dtau)?;
        }
    }
    Ok(())
}

fn big_stack() {
    let cli = Cli::parse();

    let res = match cli.cells {
        20 => run::<20>(cli),
        40 => run::<40>(cli),
        80 => run::<80>(cli),
        _ => {
            error!("The number of cells must be a value from the list {{20,40,80}}.");
            process::exit(2);
        }
    };
    if let Err(e) = res {
        error!("{}", e);
        process::exit(1);
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    const STACK_SIZE: usize = 64 * 1024 * 1024;
    let child = thread::Builder::new().stack_size(STACK_SIZE).spawn(big_stack);
    match child.map(|c| c.join()) {
        Ok(Ok(())) => {}
        _ => {
            error!("the extraction thread could not run to completion");
            process::exit(1);
        }
    }
}
