use std::path::Path;

use tracing::debug;

use crate::{
    error::{FreezeOutError, Result},
    hydro::{utils::load_table, HBARC},
};

use super::{cubic_spline::CubicSpline, EquationOfState};

/// Equation of state at vanishing baryon density read from a table with the
/// columns `e [GeV.fm^-3]`, `P [GeV.fm^-3]`, `T [GeV]`.
///
/// Below the first row the gas is extrapolated as conformal. The chemical
/// potential is always zero.
#[derive(Clone, Debug)]
pub struct Tabulated {
    p: CubicSpline,
    t: CubicSpline,
}

impl Tabulated {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Tabulated> {
        let rows = load_table(path.as_ref())?;
        debug!("loaded {} rows of equation of state", rows.len());
        Tabulated::from_rows(&rows)
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Tabulated> {
        if let Some(i) = rows.iter().position(|r| r.len() < 3) {
            return Err(FreezeOutError::Parse {
                line: i + 1,
                reason: "expected the three columns e, P, T".to_string(),
            });
        }
        // [GeV.fm^-3, GeV.fm^-3, GeV] -> [fm^-4, fm^-4, fm^-1]
        let es: Vec<f64> = rows.iter().map(|r| r[0] / HBARC).collect();
        let ps: Vec<f64> = rows.iter().map(|r| r[1] / HBARC).collect();
        let ts: Vec<f64> = rows.iter().map(|r| r[2] / HBARC).collect();
        Ok(Tabulated {
            p: CubicSpline::new(&es, &ps)?,
            t: CubicSpline::new(&es, &ts)?,
        })
    }

    fn check(e: f64) -> Result<()> {
        if e < 0.0 || !e.is_finite() {
            Err(FreezeOutError::Eos(format!(
                "tabulated equation of state evaluated at e = {e}"
            )))
        } else {
            Ok(())
        }
    }
}

impl EquationOfState for Tabulated {
    fn temperature(&self, e: f64, _rhob: f64) -> Result<f64> {
        Tabulated::check(e)?;
        let (e0, t0) = self.t.first();
        let t = if e < e0 {
            t0 * (e / e0).powf(0.25)
        } else {
            self.t.eval(e)
        };
        if t < 0.0 {
            return Err(FreezeOutError::Eos(format!(
                "table gives the negative temperature {t} at e = {e}"
            )));
        }
        Ok(t)
    }

    fn chemical_potential(&self, e: f64, _rhob: f64) -> Result<f64> {
        Tabulated::check(e)?;
        Ok(0.0)
    }

    fn pressure(&self, e: f64, _rhob: f64) -> Result<f64> {
        Tabulated::check(e)?;
        let (e0, p0) = self.p.first();
        Ok(if e < e0 { p0 * e / e0 } else { self.p.eval(e) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn conformal_rows() -> Vec<Vec<f64>> {
        (1..=40)
            .map(|i| {
                let t = 0.05 * i as f64;
                let e = 12.0 * t.powi(4);
                vec![e, e / 3.0, t]
            })
            .collect()
    }

    #[test]
    fn pressure_follows_table() {
        let eos = Tabulated::from_rows(&conformal_rows()).unwrap();
        let e = 3.3 / HBARC;
        assert_relative_eq!(eos.pressure(e, 0.0).unwrap(), e / 3.0, max_relative = 1e-8);
    }

    #[test]
    fn extrapolates_below_table() {
        let eos = Tabulated::from_rows(&conformal_rows()).unwrap();
        let e = 12.0 * 0.01f64.powi(4) / HBARC;
        let t = eos.temperature(e, 0.0).unwrap();
        assert_relative_eq!(t, 0.01 / HBARC, max_relative = 1e-8);
    }

    #[test]
    fn short_rows_are_rejected() {
        let rows = vec![vec![1.0, 0.3, 0.1], vec![2.0, 0.6]];
        assert!(matches!(
            Tabulated::from_rows(&rows),
            Err(FreezeOutError::Parse { line: 2, .. })
        ));
    }
}
