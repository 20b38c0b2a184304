use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    process,
};

use clap::Parser;
use implfreezeout::{
    config::read_info,
    error::Result,
    hydro::{isosurface::record::read_surface, isosurface::record::SurfaceElement, HBARC},
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Totals of the freeze-out surfaces of a run", long_about = None)]
struct Cli {
    /// Directories holding info.txt and the surface{rank}.dat files.
    #[arg(default_value = "results")]
    dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub elements: usize,
    pub volume: f64,      // sum of |sigma|
    pub temperature: f64, // sum of T [fm^-1]
    pub mu_b: f64,        // sum of mu_B [fm^-1]
}

impl Totals {
    pub fn of(elements: &[SurfaceElement]) -> Totals {
        elements.iter().fold(Totals::default(), |acc, s| Totals {
            elements: acc.elements + 1,
            volume: acc.volume + s.sigma.iter().map(|v| v * v).sum::<f64>().sqrt(),
            temperature: acc.temperature + s.temperature,
            mu_b: acc.mu_b + s.mu_b,
        })
    }
}

/// Ratio `f(sum a, sum b)` and its jackknife error over the samples.
pub fn jacknife<F: Fn(f64, f64) -> f64>(f: F, aa: &[f64], bb: &[f64]) -> (f64, f64) {
    let a: f64 = aa.iter().sum();
    let b: f64 = bb.iter().sum();
    let val = f(a, b);
    let l = aa.len();
    if l > 1 {
        let fs: Vec<f64> = aa
            .iter()
            .zip(bb.iter())
            .map(|(ia, ib)| f(a - ia, b - ib))
            .collect();
        let fh = fs.iter().sum::<f64>() / l as f64;
        let vh = fs.iter().map(|f| (f - fh).powi(2)).sum::<f64>() / l as f64;
        (val, ((l - 1) as f64 * vh).sqrt())
    } else {
        (val, 0.0)
    }
}

fn analyse(dir: &Path) -> Result<()> {
    let info = read_info(dir)?;
    let mut per_rank = vec![];
    for rank in 0..info.ranks {
        let path = dir.join(format!("surface{rank}.dat"));
        if !path.exists() {
            warn!("{} is missing", path.display());
            continue;
        }
        let elements = read_surface(BufReader::new(File::open(&path)?), info.config.bulk)?;
        per_rank.push(Totals::of(&elements));
    }

    let total = per_rank.iter().fold(Totals::default(), |acc, t| Totals {
        elements: acc.elements + t.elements,
        volume: acc.volume + t.volume,
        temperature: acc.temperature + t.temperature,
        mu_b: acc.mu_b + t.mu_b,
    });
    let counts: Vec<f64> = per_rank.iter().map(|t| t.elements as f64).collect();
    let temps: Vec<f64> = per_rank.iter().map(|t| t.temperature).collect();
    let mus: Vec<f64> = per_rank.iter().map(|t| t.mu_b).collect();
    let mean = |sum: f64, n: f64| if n > 0.0 { sum / n * HBARC } else { 0.0 };
    let (t, terr) = jacknife(mean, &temps, &counts);
    let (mu, muerr) = jacknife(mean, &mus, &counts);

    info!(
        "{}: {} ranks, freeze-out at {:.4} GeV/fm^3",
        dir.display(),
        per_rank.len(),
        info.freezeout_energy * HBARC
    );
    println!("# dir elements sum|sigma| <T>[GeV] err <muB>[GeV] err");
    println!(
        "{} {} {:.6e} {:.6} {:.6} {:.6} {:.6}",
        dir.display(),
        total.elements,
        total.volume,
        t,
        terr,
        mu,
        muerr
    );
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let mut failed = false;
    for dir in cli.dirs.iter() {
        if let Err(e) = analyse(dir) {
            error!("{}: {}", dir.display(), e);
            failed = true;
        }
    }
    if failed {
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn jacknife_of_identical_samples_has_no_error() {
        let (v, e) = jacknife(|a, b| a / b, &[2.0, 2.0, 2.0], &[1.0, 1.0, 1.0]);
        assert_relative_eq!(v, 2.0);
        assert_relative_eq!(e, 0.0);
    }

    #[test]
    fn jacknife_of_one_sample() {
        let (v, e) = jacknife(|a, b| a / b, &[3.0], &[2.0]);
        assert_relative_eq!(v, 1.5);
        assert_eq!(e, 0.0);
    }

    #[test]
    fn totals_sum_elements() {
        let s = SurfaceElement {
            pos: [1.0, 0.0, 0.0, 0.0],
            sigma: [3.0, 4.0, 0.0, 0.0],
            u: [1.0, 0.0, 0.0, 0.0],
            e: 1.0,
            temperature: 0.5,
            mu_b: 0.1,
            enthalpy_over_t: 2.0,
            pi: [0.0; 10],
            bulk: None,
        };
        let t = Totals::of(&[s.clone(), s]);
        assert_eq!(t.elements, 2);
        assert_relative_eq!(t.volume, 10.0);
        assert_relative_eq!(t.temperature, 1.0);
    }
}
