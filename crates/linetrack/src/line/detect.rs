//! Per-frame line estimation: scan → project → robust fit.

use image::GrayImage;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::curve::Curve;
use super::ransac::{fit_curve_ransac, FitError};
use super::signature::{candidate_points, scan_rows, CandidateSet, RowSample};
use crate::config::LineConfig;
use crate::geometry::GroundMapper;

/// Line estimate for one frame.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LineEstimate {
    /// Fitted ground-plane curve, if the fit succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<Curve>,
    /// Fraction of sampled rows supporting the curve, 0 without a curve.
    pub confidence: f32,
    /// Per-row scan results (pixel space).
    pub rows: Vec<RowSample>,
    /// Ground-plane candidates, one per sampled row.
    pub candidates: CandidateSet,
    /// Indices into `candidates` used for the final fit.
    pub inliers: Vec<usize>,
}

impl LineEstimate {
    fn without_curve(rows: Vec<RowSample>, candidates: CandidateSet) -> Self {
        Self {
            curve: None,
            confidence: 0.0,
            rows,
            candidates,
            inliers: Vec::new(),
        }
    }

    /// Number of rows that produced a ground-plane candidate.
    pub fn n_candidates(&self) -> usize {
        self.candidates.iter().filter(|p| p.is_some()).count()
    }
}

/// Line estimator context: configuration plus the RANSAC random source.
///
/// Each call is independent; an interrupted call leaves nothing behind.
pub struct LineDetector {
    config: LineConfig,
    rng: StdRng,
}

impl LineDetector {
    /// Seeds from `config.ransac.seed`, or from OS entropy when unset.
    pub fn new(config: LineConfig) -> Self {
        let rng = match config.ransac.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    /// Estimate the track curve in `img`.
    pub fn estimate(&mut self, img: &GrayImage, mapper: &dyn GroundMapper) -> LineEstimate {
        let rows = scan_rows(img, &self.config);
        let candidates = candidate_points(&rows, mapper);

        match fit_curve_ransac(
            &candidates,
            self.config.degree,
            &self.config.ransac,
            &mut self.rng,
        ) {
            Ok(fit) => {
                tracing::debug!(
                    "line: {}/{} rows support the curve (confidence {:.2})",
                    fit.inlier_count(),
                    candidates.len(),
                    fit.confidence
                );
                LineEstimate {
                    curve: Some(fit.curve),
                    confidence: fit.confidence,
                    rows,
                    candidates,
                    inliers: fit.inliers,
                }
            }
            Err(FitError::TooFewPoints { needed, got }) => {
                tracing::debug!("line: {} candidate rows, need {}; fit skipped", got, needed);
                LineEstimate::without_curve(rows, candidates)
            }
            Err(e) => {
                tracing::debug!("line: fit failed: {}", e);
                LineEstimate::without_curve(rows, candidates)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RansacConfig;
    use crate::geometry::GroundProjection;
    use crate::test_utils::{draw_curved_line, rows_forward_projection};
    use approx::assert_abs_diff_eq;

    fn seeded(config: LineConfig) -> LineDetector {
        LineDetector::new(LineConfig {
            ransac: RansacConfig {
                seed: Some(17),
                ..config.ransac.clone()
            },
            ..config
        })
    }

    #[test]
    fn fits_curved_dark_line() {
        let (w, h) = (320u32, 240u32);
        let lateral = |x: f64| 5.0 + 0.1 * x + 4e-4 * x * x;
        let proj = rows_forward_projection(w, h);
        let img = draw_curved_line(w, h, &proj, lateral, 8, 210, 30);

        let mut det = seeded(LineConfig::default());
        let est = det.estimate(&img, &proj);
        let curve = est.curve.as_ref().expect("curve");
        assert_eq!(est.n_candidates(), 16);
        assert!(est.confidence > 0.9, "confidence {}", est.confidence);
        for x in [20.0, 100.0, 180.0] {
            assert_abs_diff_eq!(curve.eval(x), lateral(x), epsilon = 1.5);
        }
    }

    #[test]
    fn blank_frame_has_zero_confidence() {
        let img = GrayImage::from_pixel(160, 120, image::Luma([90]));
        let mut det = seeded(LineConfig::default());
        let est = det.estimate(&img, &GroundProjection::identity());
        assert!(est.curve.is_none());
        assert_eq!(est.confidence, 0.0);
        assert_eq!(est.rows.len(), 16);
        assert!(est.inliers.is_empty());
    }

    #[test]
    fn light_line_needs_light_polarity() {
        let (w, h) = (320u32, 240u32);
        let proj = rows_forward_projection(w, h);
        let img = draw_curved_line(w, h, &proj, |_| 0.0, 8, 30, 220);

        let mut dark = seeded(LineConfig::default());
        assert!(dark.estimate(&img, &proj).curve.is_none());

        let mut light = seeded(LineConfig {
            polarity: crate::config::TrackPolarity::LightLine,
            ..LineConfig::default()
        });
        let est = light.estimate(&img, &proj);
        let curve = est.curve.expect("light line fit");
        assert_abs_diff_eq!(curve.eval(100.0), 0.0, epsilon = 1.5);
    }
}
