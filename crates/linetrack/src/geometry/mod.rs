//! Pixel ↔ ground-plane mapping.
//!
//! Ground-plane coordinates use the vehicle frame: `x` points forward from
//! the projection origin, `y` points to the left. Units are whatever the
//! projection was calibrated in (the defaults assume millimetres).

mod projection;

pub use projection::{
    CameraIntrinsics, CameraMount, GroundProjection, ProjectionError, ProjectionSpec,
};

/// Mapping between image pixels and ground-plane coordinates.
///
/// Both methods must be approximate inverses of each other. Return `None`
/// when a point cannot be mapped (e.g. a pixel above the horizon, or a ground
/// point behind the camera).
///
/// # Example
///
/// ```
/// use linetrack::GroundMapper;
///
/// struct Identity;
///
/// impl GroundMapper for Identity {
///     fn pixel_to_ground(&self, p: [f64; 2]) -> Option<[f64; 2]> {
///         Some(p)
///     }
///     fn ground_to_pixel(&self, g: [f64; 2]) -> Option<[f64; 2]> {
///         Some(g)
///     }
/// }
/// ```
pub trait GroundMapper {
    /// Map an image pixel `(u, v)` to ground-plane `(x, y)`.
    fn pixel_to_ground(&self, pixel_xy: [f64; 2]) -> Option<[f64; 2]>;
    /// Map a ground-plane point back to image pixel coordinates.
    fn ground_to_pixel(&self, ground_xy: [f64; 2]) -> Option<[f64; 2]>;
}
