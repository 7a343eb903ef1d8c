//! RANSAC wrapper for outlier-robust polynomial curve fitting.

use rand::Rng;

use super::curve::Curve;
use super::poly::{eval_polynomial, fit_polynomial};
use crate::config::RansacConfig;

// ── Error type ─────────────────────────────────────────────────────────────

/// Reasons a curve fit produced no model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    /// Fewer valid candidates than twice the number of coefficients.
    TooFewPoints {
        /// Required minimum number of valid points.
        needed: usize,
        /// Number of valid points provided.
        got: usize,
    },
    /// No iteration found a model supported by any non-sample point.
    NoConsensus,
    /// The final least-squares refit was rank deficient.
    Singular,
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { needed, got } => {
                write!(f, "too few points: need {}, got {}", needed, got)
            }
            Self::NoConsensus => write!(f, "no model reached a non-empty consensus"),
            Self::Singular => write!(f, "inlier refit is singular"),
        }
    }
}

impl std::error::Error for FitError {}

// ── Result ─────────────────────────────────────────────────────────────────

/// Outcome of [`fit_curve_ransac`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CurveFit {
    /// Least-squares refit over the best inlier set.
    pub curve: Curve,
    /// Inliers of the best model, excluding its minimal sample.
    pub consensus: usize,
    /// Candidate indices used by the refit (minimal sample + consensus), ascending.
    pub inliers: Vec<usize>,
    /// `(consensus + K) / candidates.len()`.
    pub confidence: f32,
}

impl CurveFit {
    /// Total supporting points (minimal sample included).
    pub fn inlier_count(&self) -> usize {
        self.inliers.len()
    }
}

struct Model {
    coeffs: Vec<f64>,
    members: Vec<usize>,
    consensus: usize,
    min_x: f64,
    max_x: f64,
}

/// Fit a polynomial of `degree` to the valid entries of `candidates`.
///
/// Each iteration draws `K = degree + 1` distinct valid points, interpolates
/// them exactly, and counts the other valid points within
/// `config.inlier_limit` of the model (vertical residual). The model with
/// the strictly largest count wins; ties keep the earlier model. The returned
/// curve is the least-squares refit over that model's points.
///
/// Iterations whose sample cannot be drawn or fitted are skipped, so the
/// call always finishes after `config.iterations` rounds.
pub fn fit_curve_ransac(
    candidates: &[Option<[f64; 2]>],
    degree: usize,
    config: &RansacConfig,
    rng: &mut impl Rng,
) -> Result<CurveFit, FitError> {
    let k = degree + 1;
    let valid: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.map(|_| i))
        .collect();
    if valid.len() < 2 * k {
        return Err(FitError::TooFewPoints {
            needed: 2 * k,
            got: valid.len(),
        });
    }
    let point = |i: usize| candidates[i].unwrap_or([f64::NAN, f64::NAN]);

    let mut best: Option<Model> = None;
    let mut best_consensus = 0usize;

    for _ in 0..config.iterations {
        let Some(sample) = sample_indices(rng, &valid, k, config.min_sample_row_gap) else {
            continue;
        };
        let xs: Vec<f64> = sample.iter().map(|&i| point(i)[0]).collect();
        let ys: Vec<f64> = sample.iter().map(|&i| point(i)[1]).collect();
        let Some(coeffs) = fit_polynomial(&xs, &ys, degree) else {
            continue;
        };

        let mut min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut members = sample.clone();
        let mut consensus = 0usize;
        for &i in &valid {
            if sample.contains(&i) {
                continue;
            }
            let [x, y] = point(i);
            if (eval_polynomial(&coeffs, x) - y).abs() < config.inlier_limit {
                consensus += 1;
                members.push(i);
                min_x = min_x.min(x);
                max_x = max_x.max(x);
            }
        }

        if consensus > best_consensus {
            best_consensus = consensus;
            best = Some(Model {
                coeffs,
                members,
                consensus,
                min_x,
                max_x,
            });
        }
    }

    let Some(mut best) = best else {
        return Err(FitError::NoConsensus);
    };
    best.members.sort_unstable();

    let xs: Vec<f64> = best.members.iter().map(|&i| point(i)[0]).collect();
    let ys: Vec<f64> = best.members.iter().map(|&i| point(i)[1]).collect();
    let coeffs = fit_polynomial(&xs, &ys, degree).ok_or(FitError::Singular)?;
    tracing::debug!(
        "curve fit: consensus {} (+{} sample) of {} valid, sample model {:?}",
        best.consensus,
        k,
        valid.len(),
        best.coeffs
    );

    Ok(CurveFit {
        curve: Curve {
            coeffs,
            min_x: best.min_x,
            max_x: best.max_x,
        },
        consensus: best.consensus,
        inliers: best.members,
        confidence: (best.consensus + k) as f32 / candidates.len() as f32,
    })
}

/// Draw `k` distinct entries of `pool` uniformly (partial Fisher–Yates).
///
/// With `min_gap > 0` an entry is skipped when it lies within `min_gap` of an
/// already drawn entry. Returns `None` when no such sample exists in the
/// shuffled order.
pub(crate) fn sample_indices(
    rng: &mut impl Rng,
    pool: &[usize],
    k: usize,
    min_gap: usize,
) -> Option<Vec<usize>> {
    if pool.len() < k {
        return None;
    }
    let mut shuffled = pool.to_vec();
    let mut picked = Vec::with_capacity(k);
    for i in 0..shuffled.len() {
        let j = rng.gen_range(i..shuffled.len());
        shuffled.swap(i, j);
        let idx = shuffled[i];
        if picked.iter().all(|&p: &usize| p.abs_diff(idx) > min_gap) {
            picked.push(idx);
            if picked.len() == k {
                return Some(picked);
            }
        }
    }
    None
}
