//! Tunable parameters for line estimation and visual odometry.

use std::path::Path;

/// Contrast of the tracked line against the floor.
///
/// Decides which gradient extremum must come first (left to right) in a row
/// response profile for the pair to count as a line signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackPolarity {
    /// Dark line on a light floor: falling edge, then rising edge.
    #[default]
    DarkLine,
    /// Light line on a dark floor: rising edge, then falling edge.
    LightLine,
}

impl TrackPolarity {
    /// Sign applied to the raw response so that the leading edge is negative.
    pub(crate) fn sign(self) -> i32 {
        match self {
            Self::DarkLine => 1,
            Self::LightLine => -1,
        }
    }
}

/// RANSAC controls for the curve fit.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    /// Number of minimal-sample iterations.
    pub iterations: usize,
    /// A point is an inlier when `|poly(x) - y|` is below this (ground units).
    pub inlier_limit: f64,
    /// Rows of one minimal sample must be more than this many sampled-row
    /// indices apart. `0` disables the constraint.
    pub min_sample_row_gap: usize,
    /// Random seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            iterations: 25,
            inlier_limit: 10.0,
            min_sample_row_gap: 0,
            seed: None,
        }
    }
}

/// Configuration of the line estimator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Number of image rows sampled per frame.
    pub nb_lines_sampled: usize,
    /// First sampled row; the remaining rows are evenly spaced down to the
    /// bottom of the image.
    pub first_line: u32,
    /// Minimum `|min| + |max|` gradient response for a signature.
    pub score_threshold: i32,
    /// Maximum column distance between the two edges of a signature.
    pub width_threshold: u32,
    /// Line contrast.
    pub polarity: TrackPolarity,
    /// Polynomial degree of the fitted curve (K - 1).
    pub degree: usize,
    /// Robust fit controls.
    pub ransac: RansacConfig,
    /// Ground distance used for steering curvature.
    pub lookahead: f64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            nb_lines_sampled: 16,
            first_line: 8,
            score_threshold: 200,
            width_threshold: 100,
            polarity: TrackPolarity::DarkLine,
            degree: 2,
            ransac: RansacConfig::default(),
            lookahead: 400.0,
        }
    }
}

impl LineConfig {
    /// Number of polynomial coefficients (K).
    pub fn n_coeffs(&self) -> usize {
        self.degree + 1
    }

    /// Minimum number of valid rows required to attempt a fit (2K).
    pub fn min_points(&self) -> usize {
        2 * self.n_coeffs()
    }
}

/// Configuration of the sparse visual odometry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OdometryConfig {
    /// Capacity of each rolling feature stack.
    pub stack_size: usize,
    /// Descriptor length in bits (multiple of 8).
    pub descriptor_length: usize,
    /// Side of the square sampling window, also the required border margin.
    pub descriptor_window: u32,
    /// Hamming distance below which two descriptors match.
    pub match_threshold: u32,
    /// FAST-9 intensity threshold.
    pub fast_threshold: u8,
    /// Radius of corner non-maximum suppression; `0` keeps every corner.
    pub nonmax_radius: u32,
    /// First image row scanned for corners. When unset the row is derived
    /// from the projection at `horizon_distance`.
    pub start_row: Option<u32>,
    /// Ground distance whose image row bounds the corner search.
    pub horizon_distance: f64,
    /// Pattern seed. `None` seeds from OS entropy.
    pub pattern_seed: Option<u64>,
}

impl Default for OdometryConfig {
    fn default() -> Self {
        Self {
            stack_size: 512,
            descriptor_length: 256,
            descriptor_window: 24,
            match_threshold: 40,
            fast_threshold: 60,
            nonmax_radius: 1,
            start_row: None,
            horizon_distance: 400.0,
            pattern_seed: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    pub line: LineConfig,
    pub odometry: OdometryConfig,
}

impl PerceptionConfig {
    /// Load and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), String> {
        let line = &self.line;
        if line.nb_lines_sampled == 0 {
            return Err("line.nb_lines_sampled must be > 0".into());
        }
        if line.first_line == 0 {
            return Err("line.first_line must be >= 1 (the kernel reads the row above)".into());
        }
        if line.ransac.inlier_limit <= 0.0 || !line.ransac.inlier_limit.is_finite() {
            return Err(format!(
                "line.ransac.inlier_limit must be positive, got {}",
                line.ransac.inlier_limit
            ));
        }
        if line.min_points() > line.nb_lines_sampled {
            return Err(format!(
                "degree {} needs {} sampled rows, only {} configured",
                line.degree,
                line.min_points(),
                line.nb_lines_sampled
            ));
        }
        if line.lookahead == 0.0 || !line.lookahead.is_finite() {
            return Err("line.lookahead must be finite and non-zero".into());
        }

        let odo = &self.odometry;
        if odo.descriptor_length == 0 || odo.descriptor_length % 8 != 0 {
            return Err(format!(
                "odometry.descriptor_length must be a positive multiple of 8, got {}",
                odo.descriptor_length
            ));
        }
        if odo.descriptor_window < 2 || odo.descriptor_window > 255 {
            return Err(format!(
                "odometry.descriptor_window must be in [2, 255], got {}",
                odo.descriptor_window
            ));
        }
        if odo.stack_size == 0 {
            return Err("odometry.stack_size must be > 0".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PerceptionConfig::default().validate().unwrap();
        assert_eq!(LineConfig::default().min_points(), 6);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: PerceptionConfig =
            serde_json::from_str(r#"{"line":{"polarity":"light_line","ransac":{"seed":7}}}"#)
                .unwrap();
        assert_eq!(cfg.line.polarity, TrackPolarity::LightLine);
        assert_eq!(cfg.line.ransac.seed, Some(7));
        assert_eq!(cfg.line.ransac.iterations, 25);
        assert_eq!(cfg.odometry.stack_size, 512);
    }

    #[test]
    fn rejects_bad_descriptor_length() {
        let mut cfg = PerceptionConfig::default();
        cfg.odometry.descriptor_length = 250;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_degree_too_high_for_rows() {
        let mut cfg = PerceptionConfig::default();
        cfg.line.degree = 8;
        assert!(cfg.validate().is_err());
    }
}
