pub mod conformal;
pub mod cubic_spline;
pub mod table;

use std::cell::RefCell;

use clap::ValueEnum;

use crate::{
    error::{FreezeOutError, Result},
    solver::newton::newton,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EOSs {
    Conformal,
    Table,
}

/// Thermodynamics needed at freeze-out, in fm units.
///
/// Implementations are pure. A provider must return an error instead of a
/// negative temperature.
pub trait EquationOfState {
    fn temperature(&self, e: f64, rhob: f64) -> Result<f64>;
    fn chemical_potential(&self, e: f64, rhob: f64) -> Result<f64>;
    fn pressure(&self, e: f64, rhob: f64) -> Result<f64>;
}

/// Energy density [fm^-4] at which the temperature equals `temperature`
/// [fm^-1] for a vanishing baryon density. A failure of the provider is
/// reported in place of the missing root.
pub fn freezeout_energy(eos: &dyn EquationOfState, temperature: f64) -> Result<f64> {
    let failure: RefCell<Option<FreezeOutError>> = RefCell::new(None);
    let root = newton(
        1e-10,
        temperature,
        |e| match eos.temperature(e, 0.0) {
            Ok(t) => t - temperature,
            Err(err) => {
                failure.borrow_mut().get_or_insert(err);
                f64::NAN
            }
        },
        |e| e.max(0.0).min(1e10),
    );
    root.map_err(|err| failure.into_inner().unwrap_or(err))
}

#[cfg(test)]
mod tests {
    use super::{conformal::Conformal, *};
    use approx::assert_relative_eq;

    #[test]
    fn freezeout_energy_inverts_temperature() {
        let eos = Conformal::qgp();
        let t = 0.15 / crate::hydro::HBARC;
        let e = freezeout_energy(&eos, t).unwrap();
        assert_relative_eq!(eos.temperature(e, 0.0).unwrap(), t, max_relative = 1e-8);
    }

    struct Broken;

    impl EquationOfState for Broken {
        fn temperature(&self, e: f64, _rhob: f64) -> Result<f64> {
            Err(FreezeOutError::Eos(format!("no temperature at e = {e}")))
        }
        fn chemical_potential(&self, _e: f64, _rhob: f64) -> Result<f64> {
            Ok(0.0)
        }
        fn pressure(&self, e: f64, _rhob: f64) -> Result<f64> {
            Ok(e / 3.0)
        }
    }

    #[test]
    fn provider_failure_is_reported() {
        let err = freezeout_energy(&Broken, 0.5).unwrap_err();
        assert!(matches!(err, FreezeOutError::Eos(_)), "{err}");
    }
}
