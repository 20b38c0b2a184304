use crate::error::{FreezeOutError, Result};

fn cubic(x: f64, p: &[f64; 4]) -> f64 {
    p[0] + x * (p[1] + x * (p[2] + x * p[3]))
}

/// Natural cubic spline through `(xs[i], ys[i])` on strictly increasing,
/// possibly non-uniform knots.
///
/// Every segment is stored as a cubic in the local coordinate
/// `(x - xs[i]) / (xs[i + 1] - xs[i])`.
#[derive(Clone, Debug)]
pub struct CubicSpline {
    xs: Vec<f64>,
    pols: Vec<[f64; 4]>,
}

impl CubicSpline {
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<CubicSpline> {
        let n = xs.len();
        if n < 3 || ys.len() != n {
            return Err(FreezeOutError::InvalidConfig(format!(
                "a cubic spline needs at least 3 knots and as many values, got {} and {}",
                n,
                ys.len()
            )));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(FreezeOutError::InvalidConfig(
                "cubic spline knots must be strictly increasing".to_string(),
            ));
        }

        let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
        let delta: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

        // tridiagonal system for the slopes, natural boundary conditions
        let mut sub = vec![0.0f64; n];
        let mut diag = vec![0.0f64; n];
        let mut sup = vec![0.0f64; n];
        let mut rhs = vec![0.0f64; n];
        diag[0] = 2.0;
        sup[0] = 1.0;
        rhs[0] = 3.0 * delta[0];
        for i in 1..n - 1 {
            sub[i] = h[i];
            diag[i] = 2.0 * (h[i - 1] + h[i]);
            sup[i] = h[i - 1];
            rhs[i] = 3.0 * (h[i] * delta[i - 1] + h[i - 1] * delta[i]);
        }
        sub[n - 1] = 1.0;
        diag[n - 1] = 2.0;
        rhs[n - 1] = 3.0 * delta[n - 2];

        for i in 1..n {
            let d = sub[i] / diag[i - 1];
            diag[i] -= d * sup[i - 1];
            rhs[i] -= d * rhs[i - 1];
        }
        let mut m = vec![0.0f64; n];
        m[n - 1] = rhs[n - 1] / diag[n - 1];
        for i in (0..n - 1).rev() {
            m[i] = (rhs[i] - sup[i] * m[i + 1]) / diag[i];
        }

        let pols = (0..n - 1)
            .map(|i| {
                let (y0, y1) = (ys[i], ys[i + 1]);
                let (m0, m1) = (m[i] * h[i], m[i + 1] * h[i]);
                [
                    y0,
                    m0,
                    3.0 * (y1 - y0) - 2.0 * m0 - m1,
                    2.0 * (y0 - y1) + m0 + m1,
                ]
            })
            .collect();

        Ok(CubicSpline {
            xs: xs.to_vec(),
            pols,
        })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let last = self.pols.len() - 1;
        let i = self.xs.partition_point(|&k| k <= x).saturating_sub(1).min(last);
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        cubic(t, &self.pols[i])
    }

    pub fn first(&self) -> (f64, f64) {
        (self.xs[0], self.pols[0][0])
    }
}
