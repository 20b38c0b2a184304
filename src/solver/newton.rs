use crate::error::{FreezeOutError, Result};

/// Scalar Newton iteration with a finite-difference derivative.
///
/// `constraint` is applied after every step to keep the iterate inside the
/// domain of `f`. Fails after 100 iterations or on a NaN residual.
pub fn newton(
    er: f64,
    mut v: f64,
    f: impl Fn(f64) -> f64,
    constraint: impl Fn(f64) -> f64,
) -> Result<f64> {
    let start = v;
    let mut fv = f(v);
    let mut e = fv.abs();
    let mut i = 0;
    let maxi = 100;
    while e >= er && i < maxi {
        i += 1;
        let ff = (f(v + er) - fv) / er;
        if ff == 0.0 || !ff.is_finite() {
            break;
        }
        v -= fv / ff;
        v = constraint(v);
        fv = f(v);
        e = fv.abs();
    }
    if !(e < er) || !v.is_finite() {
        Err(FreezeOutError::RootNotFound { start })
    } else {
        Ok(v)
    }
}
