//! Fitted track curve and pure-pursuit steering.

use serde::{Deserialize, Serialize};

use super::poly::eval_polynomial;

/// Polynomial `y = Σ coeffs[i] · x^i` in ground-plane coordinates.
///
/// `min_x`/`max_x` bound the forward range over which the inliers of the
/// fit were observed; evaluating outside it is extrapolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub coeffs: Vec<f64>,
    pub min_x: f64,
    pub max_x: f64,
}

impl Curve {
    /// Polynomial degree.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Lateral offset of the curve at forward distance `x`.
    pub fn eval(&self, x: f64) -> f64 {
        eval_polynomial(&self.coeffs, x)
    }

    /// Steering curvature toward the curve point at `x_lookahead`.
    ///
    /// With `y = eval(x_lookahead)` and `D² = x² + y²`, the turning radius is
    /// `r = D² / (2·x_lookahead)` and the curvature `1 / r`.
    ///
    /// `x_lookahead` must be non-zero; zero yields `NaN`.
    pub fn steering_curvature(&self, x_lookahead: f64) -> f64 {
        if x_lookahead == 0.0 {
            return f64::NAN;
        }
        let y = self.eval(x_lookahead);
        let d2 = x_lookahead * x_lookahead + y * y;
        let r = d2 / (2.0 * x_lookahead);
        1.0 / r
    }
}

/// Free-function form of [`Curve::steering_curvature`].
pub fn steering_curvature(curve: &Curve, lookahead_distance: f64) -> f64 {
    curve.steering_curvature(lookahead_distance)
}
