//! Track curve estimation.
//!
//! Pipeline per frame:
//! 1. **Signature** – gradient profile on a fixed set of rows, one line
//!    centre per row.
//! 2. **Projection** – row centres mapped onto the ground plane.
//! 3. **RANSAC** – robust polynomial fit with an inlier-ratio confidence.
//! 4. **Curvature** – pure-pursuit steering at a lookahead distance.

mod curve;
mod detect;
mod poly;
mod ransac;
mod signature;

pub use curve::{steering_curvature, Curve};
pub use detect::{LineDetector, LineEstimate};
pub use poly::{eval_polynomial, fit_polynomial};
pub use ransac::{fit_curve_ransac, CurveFit, FitError};
pub use signature::{
    candidate_points, find_signature, row_response, sampled_rows, scan_rows, CandidateSet,
    RowSample, RowSignature,
};
