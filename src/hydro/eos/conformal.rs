use std::f64::consts::PI;

use crate::error::{FreezeOutError, Result};

use super::EquationOfState;

/// Massless gas: `e = 3 a T^4`, `P = e / 3`, and a baryon density linear in
/// the chemical potential, `n_B = chi T^2 mu_B`.
#[derive(Clone, Copy, Debug)]
pub struct Conformal {
    pub dof: f64,
    pub susceptibility: f64,
}

impl Conformal {
    /// Two massless quark flavours and gluons.
    pub fn qgp() -> Conformal {
        Conformal {
            dof: 37.0,
            susceptibility: 2.0 / 9.0,
        }
    }

    fn stefan_boltzmann(&self) -> f64 {
        self.dof * PI * PI / 90.0
    }

    fn check(&self, e: f64) -> Result<()> {
        if e < 0.0 || !e.is_finite() {
            Err(FreezeOutError::Eos(format!(
                "conformal equation of state evaluated at e = {e}"
            )))
        } else {
            Ok(())
        }
    }
}

impl EquationOfState for Conformal {
    fn temperature(&self, e: f64, _rhob: f64) -> Result<f64> {
        self.check(e)?;
        Ok((e / (3.0 * self.stefan_boltzmann())).powf(0.25))
    }

    fn chemical_potential(&self, e: f64, rhob: f64) -> Result<f64> {
        let t = self.temperature(e, rhob)?;
        if t == 0.0 {
            return Ok(0.0);
        }
        Ok(rhob / (self.susceptibility * t * t))
    }

    fn pressure(&self, e: f64, _rhob: f64) -> Result<f64> {
        self.check(e)?;
        Ok(e / 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stefan_boltzmann_limit() {
        let eos = Conformal::qgp();
        let t: f64 = 0.8;
        let e = 3.0 * eos.stefan_boltzmann() * t.powi(4);
        assert_relative_eq!(eos.temperature(e, 0.0).unwrap(), t, max_relative = 1e-12);
        assert_relative_eq!(eos.pressure(e, 0.0).unwrap(), e / 3.0);
        assert_eq!(eos.chemical_potential(e, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn negative_energy_is_an_error() {
        let eos = Conformal::qgp();
        assert!(eos.temperature(-1.0, 0.0).is_err());
        assert!(eos.pressure(-1.0, 0.0).is_err());
    }
}
