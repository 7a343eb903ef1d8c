//! Flat-ground projection through a 3×3 homography.

use std::path::Path;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use super::GroundMapper;

// ── Error type ───────────────────────────────────────────────────────────

/// Errors raised while building a [`GroundProjection`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// The ground→pixel matrix has no inverse.
    Singular,
    /// A matrix entry or mount parameter is NaN/inf.
    NonFinite,
    /// Mount parameters that cannot see the ground.
    InvalidMount(String),
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Singular => write!(f, "ground projection matrix is singular"),
            Self::NonFinite => write!(f, "ground projection contains non-finite values"),
            Self::InvalidMount(msg) => write!(f, "invalid camera mount: {}", msg),
        }
    }
}

impl std::error::Error for ProjectionError {}

// ── Camera description ───────────────────────────────────────────────────

/// Pinhole intrinsics (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(self.fx, 0.0, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0)
    }
}

/// Camera pose above flat ground, looking forward along the vehicle `x` axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraMount {
    /// Height of the optical centre above the ground (ground units).
    pub height: f64,
    /// Downward pitch of the optical axis, in radians (0 = horizontal).
    pub pitch_rad: f64,
}

/// Serialized projection description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionSpec {
    /// Precomputed ground→pixel homography, row-major.
    Matrix { ground_to_pixel: [[f64; 3]; 3] },
    /// Intrinsics plus mount pose.
    Mount {
        intrinsics: CameraIntrinsics,
        mount: CameraMount,
    },
}

// ── Projection ───────────────────────────────────────────────────────────

/// Ground-plane projection: `pixel ~ H · [x, y, 1]ᵀ`.
///
/// `H` is scaled so that a point in front of the camera has a positive third
/// homogeneous coordinate. Pixels whose back-projection lands behind the
/// camera (above the horizon) map to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundProjection {
    ground_to_pixel: Matrix3<f64>,
    pixel_to_ground: Matrix3<f64>,
}

impl GroundProjection {
    /// Build from a precomputed ground→pixel matrix.
    ///
    /// The matrix is only defined up to scale: `H` and `-H` give the same
    /// projection. It is divided by `H22` when that is non-zero, otherwise
    /// its sign is chosen so the ground point `(1, 0)` ahead gets `w > 0`.
    pub fn from_ground_to_pixel(h: Matrix3<f64>) -> Result<Self, ProjectionError> {
        if h.iter().any(|v| !v.is_finite()) {
            return Err(ProjectionError::NonFinite);
        }
        let scale = h[(2, 2)];
        let h = if scale.abs() > 1e-12 {
            h / scale
        } else if h[(2, 0)] + scale < 0.0 {
            -h
        } else {
            h
        };
        let inv = h.try_inverse().ok_or(ProjectionError::Singular)?;
        Ok(Self {
            ground_to_pixel: h,
            pixel_to_ground: inv,
        })
    }

    /// Identity mapping (ground coordinates equal pixel coordinates).
    pub fn identity() -> Self {
        Self {
            ground_to_pixel: Matrix3::identity(),
            pixel_to_ground: Matrix3::identity(),
        }
    }

    /// Compose intrinsics with a camera pitched down by `mount.pitch_rad`
    /// at `mount.height` above the ground.
    ///
    /// Camera axes: `x` right, `y` down, `z` along the optical axis. For a
    /// ground point `(X, Y, 0)` seen from `(0, 0, h)`:
    /// `x_c = −Y`, `y_c = −X·sinθ + h·cosθ`, `z_c = X·cosθ + h·sinθ`.
    pub fn from_mount(
        intrinsics: CameraIntrinsics,
        mount: CameraMount,
    ) -> Result<Self, ProjectionError> {
        if !mount.height.is_finite() || !mount.pitch_rad.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        if mount.height <= 0.0 {
            return Err(ProjectionError::InvalidMount(format!(
                "height must be positive, got {}",
                mount.height
            )));
        }
        if mount.pitch_rad <= 0.0 || mount.pitch_rad >= std::f64::consts::FRAC_PI_2 {
            return Err(ProjectionError::InvalidMount(format!(
                "pitch must be in (0, pi/2), got {}",
                mount.pitch_rad
            )));
        }
        let (s, c) = mount.pitch_rad.sin_cos();
        let h = mount.height;
        #[rustfmt::skip]
        let extrinsic = Matrix3::new(
            0.0, -1.0, 0.0,
            -s,  0.0,  h * c,
            c,   0.0,  h * s,
        );
        Self::from_ground_to_pixel(intrinsics.matrix() * extrinsic)
    }

    /// Build from a serialized description.
    pub fn from_spec(spec: &ProjectionSpec) -> Result<Self, ProjectionError> {
        match spec {
            ProjectionSpec::Matrix { ground_to_pixel: m } => {
                Self::from_ground_to_pixel(Matrix3::from_fn(|r, c| m[r][c]))
            }
            ProjectionSpec::Mount { intrinsics, mount } => Self::from_mount(*intrinsics, *mount),
        }
    }

    /// Load a [`ProjectionSpec`] JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let spec: ProjectionSpec = serde_json::from_str(&data)?;
        Self::from_spec(&spec).map_err(Into::into)
    }

    /// Ground→pixel matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.ground_to_pixel
    }

    /// Image row of the ground point `distance` straight ahead.
    ///
    /// Everything below this row sees ground closer than `distance`.
    pub fn horizon_row(&self, distance: f64) -> Option<f64> {
        self.ground_to_pixel([distance, 0.0]).map(|p| p[1])
    }
}

fn apply(m: &Matrix3<f64>, x: f64, y: f64) -> Option<[f64; 2]> {
    let p = m * Vector3::new(x, y, 1.0);
    if p[2] <= 1e-12 {
        return None;
    }
    let out = [p[0] / p[2], p[1] / p[2]];
    (out[0].is_finite() && out[1].is_finite()).then_some(out)
}

impl GroundMapper for GroundProjection {
    fn pixel_to_ground(&self, pixel_xy: [f64; 2]) -> Option<[f64; 2]> {
        apply(&self.pixel_to_ground, pixel_xy[0], pixel_xy[1])
    }

    fn ground_to_pixel(&self, ground_xy: [f64; 2]) -> Option<[f64; 2]> {
        apply(&self.ground_to_pixel, ground_xy[0], ground_xy[1])
    }
}
