//! linetrack — perception core for a line-following vehicle.
//!
//! Two independent per-frame estimators share one ground-plane projection:
//!
//! 1. **Line** – gradient signatures on sampled rows, projected to the ground
//!    plane, fitted with a RANSAC polynomial; the curve yields a pure-pursuit
//!    steering curvature.
//! 2. **Odometry** – FAST corners described with BRIEF bits, greedily matched
//!    against the previous frame; matches become ground-plane flow vectors.
//!
//! # Public API
//! - [`Perception`] as the primary entry point
//! - [`PerceptionConfig`] and its sections for tuning
//! - [`GroundProjection`] and the [`GroundMapper`] trait
//! - the [`line`] and [`odometry`] modules for stage-level access

mod api;
mod config;
mod geometry;
pub mod line;
pub mod odometry;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::Perception;
pub use config::{LineConfig, OdometryConfig, PerceptionConfig, RansacConfig, TrackPolarity};
pub use geometry::{
    CameraIntrinsics, CameraMount, GroundMapper, GroundProjection, ProjectionError, ProjectionSpec,
};
pub use line::{Curve, LineEstimate};
pub use odometry::{FlowVector, OdometryFrame};
