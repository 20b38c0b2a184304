use std::io::{BufRead, Write};

use crate::{
    error::{FreezeOutError, Result},
    hydro::field::SHEAR,
};

const COLUMNS: usize = 16 + SHEAR;

/// One element of the freeze-out surface, in fm units.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceElement {
    pub pos: [f64; 4],   // [tau, x, y, eta]
    pub sigma: [f64; 4], // [sigma_tau, sigma_x, sigma_y, sigma_eta]
    pub u: [f64; 4],     // [utau, ux, uy, ueta]
    pub e: f64,
    pub temperature: f64,
    pub mu_b: f64,
    pub enthalpy_over_t: f64, // (e + P) / T
    pub pi: [f64; SHEAR],     // [pitt,pitx,pity,pite,pixx,pixy,pixe,piyy,piye,piee]
    pub bulk: Option<f64>,
}

impl SurfaceElement {
    pub fn to_columns(&self) -> Vec<f64> {
        let mut res = Vec::with_capacity(COLUMNS + 1);
        res.extend_from_slice(&self.pos);
        res.extend_from_slice(&self.sigma);
        res.extend_from_slice(&self.u);
        res.extend([self.e, self.temperature, self.mu_b, self.enthalpy_over_t]);
        res.extend_from_slice(&self.pi);
        if let Some(b) = self.bulk {
            res.push(b);
        }
        res
    }

    fn from_columns(line: usize, cols: &[f64]) -> Result<SurfaceElement> {
        let parse_error = |reason: String| FreezeOutError::Parse { line, reason };
        let [e, temperature, mu_b, enthalpy_over_t] = [cols[12], cols[13], cols[14], cols[15]];
        if e < 0.0 {
            return Err(parse_error(format!("negative energy density {e}")));
        }
        if temperature < 0.0 {
            return Err(parse_error(format!("negative temperature {temperature}")));
        }
        let quad = |o: usize| [cols[o], cols[o + 1], cols[o + 2], cols[o + 3]];
        let mut pi = [0.0; SHEAR];
        pi.copy_from_slice(&cols[16..COLUMNS]);
        Ok(SurfaceElement {
            pos: quad(0),
            sigma: quad(4),
            u: quad(8),
            e,
            temperature,
            mu_b,
            enthalpy_over_t,
            pi,
            bulk: cols.get(COLUMNS).copied(),
        })
    }
}

/// Writes one element per line, ten significant digits per column.
pub fn write_element<W: Write>(w: &mut W, element: &SurfaceElement) -> Result<()> {
    let line = element
        .to_columns()
        .iter()
        .map(|v| format!("{:.9e}", v))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(w, "{}", line)?;
    Ok(())
}

/// Reads back the elements of a surface file. `bulk` tells whether lines
/// carry the bulk pressure column.
pub fn read_surface<R: BufRead>(reader: R, bulk: bool) -> Result<Vec<SurfaceElement>> {
    let expected = if bulk { COLUMNS + 1 } else { COLUMNS };
    let mut elements = vec![];
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let cols = line
            .split_whitespace()
            .map(|s| {
                s.parse::<f64>().map_err(|e| FreezeOutError::Parse {
                    line: i + 1,
                    reason: format!("{s}: {e}"),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        if cols.len() != expected {
            return Err(FreezeOutError::Parse {
                line: i + 1,
                reason: format!("{} columns, expected {}", cols.len(), expected),
            });
        }
        elements.push(SurfaceElement::from_columns(i + 1, &cols)?);
    }
    Ok(elements)
}
