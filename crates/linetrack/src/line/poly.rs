//! Polynomial least squares in one variable.

use nalgebra::{DMatrix, DVector};

/// Evaluate `Σ coeffs[i] · x^i` (Horner).
pub fn eval_polynomial(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Fit `y = Σ p[i] · x^i` of the given degree.
///
/// Exact interpolation when `xs.len() == degree + 1`, ordinary least squares
/// when more points are given. Returns `None` for too few points, mismatched
/// inputs, or a rank-deficient design (e.g. repeated x values).
///
/// `x` is scaled to `[-1, 1]` before the SVD solve so that high powers stay
/// well conditioned; coefficients are mapped back afterwards.
pub fn fit_polynomial(xs: &[f64], ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = xs.len();
    let k = degree + 1;
    if n < k || ys.len() != n {
        return None;
    }

    let scale = xs.iter().fold(0.0f64, |m, x| m.max(x.abs()));
    let scale = if scale > 1e-12 { scale } else { 1.0 };

    let mut a = DMatrix::<f64>::zeros(n, k);
    for (i, &x) in xs.iter().enumerate() {
        let xn = x / scale;
        let mut p = 1.0;
        for j in 0..k {
            a[(i, j)] = p;
            p *= xn;
        }
    }
    let b = DVector::from_column_slice(ys);

    let svd = a.svd(true, true);
    let smax = svd.singular_values.max();
    if !smax.is_finite() || smax <= 0.0 {
        return None;
    }
    if svd.rank(smax * 1e-10) < k {
        return None;
    }
    let q = svd.solve(&b, smax * 1e-10).ok()?;

    let mut coeffs = Vec::with_capacity(k);
    let mut s = 1.0;
    for j in 0..k {
        coeffs.push(q[j] / s);
        s *= scale;
    }
    coeffs.iter().all(|c| c.is_finite()).then_some(coeffs)
}
