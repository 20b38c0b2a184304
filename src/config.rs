use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::{FreezeOutError, Result},
    hydro::{
        eos::{freezeout_energy, EquationOfState},
        isosurface::Grid,
        HBARC,
    },
};

/// How the freeze-out threshold is given.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Energy { epsilon_gev: f64 },     // GeV/fm^3
    Temperature { temperature_gev: f64 }, // GeV
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezeOutConfig {
    pub freezeout: Criterion,
    pub dx: f64,
    pub dy: f64,
    pub deta: f64,
    pub x_size: f64,
    pub y_size: f64,
    pub eta_size: f64,
    pub fac_x: usize,
    pub fac_eta: usize,
    pub boost_invariant: bool,
    pub bulk: bool,
    pub output_dir: PathBuf,
}

impl Default for FreezeOutConfig {
    fn default() -> Self {
        FreezeOutConfig {
            freezeout: Criterion::Energy { epsilon_gev: 0.18 },
            dx: 0.1,
            dy: 0.1,
            deta: 0.1,
            x_size: 0.0,
            y_size: 0.0,
            eta_size: 0.0,
            fac_x: 1,
            fac_eta: 1,
            boost_invariant: true,
            bulk: false,
            output_dir: PathBuf::from("results"),
        }
    }
}

/// Content of the `info.txt` written next to the surface files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub config: FreezeOutConfig,
    pub freezeout_energy: f64, // fm^-4
    pub ranks: usize,
}

impl FreezeOutConfig {
    pub fn load(path: &Path) -> Result<FreezeOutConfig> {
        let text = fs::read_to_string(path)?;
        let config: FreezeOutConfig = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(FreezeOutError::InvalidConfig(msg));
        for (name, d) in [("dx", self.dx), ("dy", self.dy), ("deta", self.deta)] {
            if !(d > 0.0) {
                return invalid(format!("{name} must be positive, got {d}"));
            }
        }
        if self.fac_x < 1 {
            return invalid("fac_x must be at least 1".to_string());
        }
        if self.fac_eta < 1 && !self.boost_invariant {
            return invalid("fac_eta must be at least 1".to_string());
        }
        let threshold = match self.freezeout {
            Criterion::Energy { epsilon_gev } => epsilon_gev,
            Criterion::Temperature { temperature_gev } => temperature_gev,
        };
        if !(threshold > 0.0) {
            return invalid(format!("freeze-out threshold must be positive, got {threshold}"));
        }
        Ok(())
    }

    pub fn grid(&self) -> Grid {
        Grid {
            dx: self.dx,
            dy: self.dy,
            deta: self.deta,
            x_size: self.x_size,
            y_size: self.y_size,
            eta_size: self.eta_size,
            fac_x: self.fac_x,
            fac_eta: if self.boost_invariant { 0 } else { self.fac_eta },
            boost_invariant: self.boost_invariant,
        }
    }

    /// Freeze-out energy density in fm^-4.
    pub fn epsilon_fo(&self, eos: &dyn EquationOfState) -> Result<f64> {
        let e = match self.freezeout {
            Criterion::Energy { epsilon_gev } => epsilon_gev / HBARC,
            Criterion::Temperature { temperature_gev } => {
                warn!("freeze-out energy found from T = {temperature_gev} GeV ignoring the baryon density");
                freezeout_energy(eos, temperature_gev / HBARC)?
            }
        };
        info!("freeze-out energy density = {:.6} GeV/fm^3", e * HBARC);
        Ok(e)
    }

    pub fn write_info(&self, freezeout_energy: f64, ranks: usize) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let info = Info {
            config: self.clone(),
            freezeout_energy,
            ranks,
        };
        fs::write(self.output_dir.join("info.txt"), serde_yaml::to_string(&info)?)?;
        Ok(())
    }
}

pub fn read_info(dir: &Path) -> Result<Info> {
    let text = fs::read_to_string(dir.join("info.txt"))?;
    Ok(serde_yaml::from_str(&text)?)
}
