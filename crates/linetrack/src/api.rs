//! Per-frame perception API.
//!
//! [`Perception`] is the entry point for the vehicle control loop. It owns
//! the configuration, the ground projection, the RANSAC random source, the
//! descriptor pattern and the rolling odometry cache. Create once, feed it
//! every frame.

use std::path::Path;
use std::sync::Arc;

use image::GrayImage;

use crate::config::PerceptionConfig;
use crate::geometry::GroundProjection;
use crate::line::{Curve, LineDetector, LineEstimate};
use crate::odometry::{DescriptorPattern, Fast9Detector, OdometryFrame, VisualOdometry};

/// Line tracking and visual odometry for one camera.
///
/// # Examples
///
/// ```no_run
/// use linetrack::{GroundProjection, Perception, PerceptionConfig};
/// use image::GrayImage;
///
/// let mut perception =
///     Perception::new(PerceptionConfig::default(), GroundProjection::identity()).unwrap();
/// let frame = GrayImage::new(320, 240);
/// let line = perception.estimate_line(&frame);
/// if let Some(curve) = &line.curve {
///     println!("curvature {:.5}", perception.steering_curvature(curve, 400.0));
/// }
/// let odo = perception.estimate_odometry(&frame);
/// println!("{} flow vectors", odo.flow.len());
/// ```
pub struct Perception {
    config: PerceptionConfig,
    projection: GroundProjection,
    line: LineDetector,
    odometry: VisualOdometry,
    corners: Fast9Detector,
}

impl Perception {
    /// Validate `config` and build the per-run state.
    ///
    /// The descriptor pattern is drawn here, once per run.
    pub fn new(config: PerceptionConfig, projection: GroundProjection) -> Result<Self, String> {
        config.validate()?;
        let odo = &config.odometry;
        let pattern = DescriptorPattern::with_seed(
            odo.descriptor_length,
            odo.descriptor_window,
            odo.pattern_seed,
        )
        .map_err(|e| e.to_string())?;
        let pattern = Arc::new(pattern);
        let corners = Fast9Detector::new(odo.fast_threshold, odo.nonmax_radius);
        Ok(Self {
            line: LineDetector::new(config.line.clone()),
            odometry: VisualOdometry::new(config.odometry.clone(), pattern),
            corners,
            projection,
            config,
        })
    }

    /// Load config and projection JSON files and build in one step.
    pub fn from_json_files(
        config_path: &Path,
        projection_path: &Path,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = PerceptionConfig::from_json_file(config_path)?;
        let projection = GroundProjection::from_json_file(projection_path)?;
        Ok(Self::new(config, projection)?)
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    pub fn projection(&self) -> &GroundProjection {
        &self.projection
    }

    /// Shared descriptor pattern of this run.
    pub fn pattern(&self) -> &Arc<DescriptorPattern> {
        self.odometry.pattern()
    }

    /// Fit the track curve in `frame`.
    pub fn estimate_line(&mut self, frame: &GrayImage) -> LineEstimate {
        self.line.estimate(frame, &self.projection)
    }

    /// Pure-pursuit curvature toward `curve` at `lookahead`.
    ///
    /// `lookahead` must be non-zero; zero yields NaN.
    pub fn steering_curvature(&self, curve: &Curve, lookahead: f64) -> f64 {
        curve.steering_curvature(lookahead)
    }

    /// Flow vectors between the previous frame and `frame`.
    ///
    /// Empty on the first call and after [`reset_odometry`](Self::reset_odometry).
    pub fn estimate_odometry(&mut self, frame: &GrayImage) -> OdometryFrame {
        let start_row = self.odometry_start_row(frame.height());
        self.odometry
            .process(frame, start_row, &self.corners, &self.projection)
    }

    /// First image row searched for corners in a frame of `height` rows.
    ///
    /// The configured row if set, otherwise the image row of the ground
    /// point `horizon_distance` straight ahead. Falls back to `0` when that
    /// point is not visible.
    pub fn odometry_start_row(&self, height: u32) -> u32 {
        let odo = &self.config.odometry;
        if let Some(row) = odo.start_row {
            return row.min(height);
        }
        match self.projection.horizon_row(odo.horizon_distance) {
            Some(v) if v.is_finite() => v.ceil().clamp(0.0, height as f64) as u32,
            _ => {
                tracing::debug!(
                    "horizon at {} not visible, scanning the whole frame",
                    odo.horizon_distance
                );
                0
            }
        }
    }

    /// Forget the cached frame; the next odometry call bootstraps.
    pub fn reset_odometry(&mut self) {
        self.odometry.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineConfig;
    use crate::odometry::OdometryState;
    use crate::test_utils::{draw_curved_line, noise_image, rows_forward_projection};

    fn seeded_config() -> PerceptionConfig {
        let mut cfg = PerceptionConfig::default();
        cfg.line.ransac.seed = Some(3);
        cfg.odometry.pattern_seed = Some(3);
        cfg
    }

    #[test]
    fn rejects_invalid_config() {
        let mut cfg = PerceptionConfig::default();
        cfg.odometry.descriptor_window = 300;
        assert!(Perception::new(cfg, GroundProjection::identity()).is_err());
    }

    #[test]
    fn line_and_curvature() {
        let (w, h) = (320, 240);
        let proj = rows_forward_projection(w, h);
        let img = draw_curved_line(w, h, &proj, |x| 0.002 * x * x, 8, 200, 40);
        let mut p = Perception::new(seeded_config(), proj).unwrap();
        let est = p.estimate_line(&img);
        let curve = est.curve.expect("curve");
        // y = 0.002 x² at x = 100: y = 20, D² = 10400, r = 52, k = 1/52.
        let k = p.steering_curvature(&curve, 100.0);
        assert!((k - 1.0 / 52.0).abs() < 2e-3, "curvature {k}");
        assert!(p.steering_curvature(&curve, 0.0).is_nan());
    }

    #[test]
    fn start_row_from_config_or_horizon() {
        let (w, h) = (320, 240);
        let mut cfg = seeded_config();
        cfg.odometry.horizon_distance = 100.0;
        let p = Perception::new(cfg.clone(), rows_forward_projection(w, h)).unwrap();
        // Ground x = 100 sits on row h - 100.
        assert_eq!(p.odometry_start_row(h), 140);

        cfg.odometry.start_row = Some(500);
        let p = Perception::new(cfg, rows_forward_projection(w, h)).unwrap();
        assert_eq!(p.odometry_start_row(h), h);
    }

    #[test]
    fn odometry_bootstraps_then_tracks() {
        let mut cfg = seeded_config();
        cfg.odometry.start_row = Some(0);
        cfg.odometry.fast_threshold = 30;
        let mut p = Perception::new(cfg, GroundProjection::identity()).unwrap();
        let img = noise_image(200, 160, 12);
        let first = p.estimate_odometry(&img);
        assert!(first.bootstrap);
        assert!(first.flow.is_empty());
        let second = p.estimate_odometry(&img);
        assert!(!second.bootstrap);
        assert_eq!(second.n_matched, second.n_features);
        p.reset_odometry();
        assert!(p.estimate_odometry(&img).bootstrap);
        assert_eq!(p.odometry.state(), OdometryState::Tracking);
    }

    #[test]
    fn config_is_kept() {
        let p = Perception::new(seeded_config(), GroundProjection::identity()).unwrap();
        assert_eq!(p.config().line.degree, LineConfig::default().degree);
        assert_eq!(p.pattern().len(), 256);
    }
}
