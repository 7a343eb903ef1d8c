//! Sparse visual odometry on the ground plane.
//!
//! Pipeline per frame:
//! 1. **Corners** – keypoints below the horizon row.
//! 2. **Descriptors** – BRIEF bits from a run-wide sampling pattern.
//! 3. **Matching** – greedy early-exit Hamming search against the previous
//!    frame's features.
//! 4. **Flow** – matched pixel pairs projected to the ground plane.

mod corners;
mod descriptor;
mod pattern;
mod stack;
mod tracker;

pub use corners::{CornerDetector, Fast9Detector};
pub use descriptor::{hamming_distance, has_margin, match_score, BinaryDescriptor};
pub use pattern::{DescriptorPattern, PatternError, SamplingPair};
pub use stack::{BoundedStack, StackError};
pub use tracker::{Feature, FeatureStack, FlowVector, OdometryFrame, OdometryState, VisualOdometry};
