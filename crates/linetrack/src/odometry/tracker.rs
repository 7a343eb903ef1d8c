//! Two-frame rolling feature cache and greedy descriptor matching.

use std::sync::Arc;

use image::GrayImage;

use super::corners::CornerDetector;
use super::descriptor::{match_score, BinaryDescriptor};
use super::pattern::DescriptorPattern;
use super::stack::BoundedStack;
use crate::config::OdometryConfig;
use crate::geometry::GroundMapper;

/// A described keypoint (full-image pixel coordinates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub position: [u32; 2],
    pub descriptor: BinaryDescriptor,
}

/// Features of one frame.
pub type FeatureStack = BoundedStack<Feature>;

/// Ground-plane displacement of one matched feature between two frames.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlowVector {
    pub previous_px: [u32; 2],
    pub current_px: [u32; 2],
    pub previous_ground: [f64; 2],
    pub current_ground: [f64; 2],
    /// `current_ground - previous_ground`.
    pub delta: [f64; 2],
}

impl FlowVector {
    fn between(previous: &Feature, current: &Feature, mapper: &dyn GroundMapper) -> Option<Self> {
        let to_f64 = |p: [u32; 2]| [p[0] as f64, p[1] as f64];
        let previous_ground = mapper.pixel_to_ground(to_f64(previous.position))?;
        let current_ground = mapper.pixel_to_ground(to_f64(current.position))?;
        Some(Self {
            previous_px: previous.position,
            current_px: current.position,
            previous_ground,
            current_ground,
            delta: [
                current_ground[0] - previous_ground[0],
                current_ground[1] - previous_ground[1],
            ],
        })
    }
}

/// Result of one [`VisualOdometry::process`] call.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct OdometryFrame {
    /// Empty on the bootstrap frame.
    pub flow: Vec<FlowVector>,
    /// Features described in this frame.
    pub n_features: usize,
    /// Current features that found a previous partner, projectable or not.
    pub n_matched: usize,
    /// Previous-frame features dropped without a partner.
    pub n_retired_unmatched: usize,
    /// Keypoints never looked at because the feature stack filled up.
    pub n_unexamined: usize,
    /// True when there was no previous frame to match against.
    pub bootstrap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdometryState {
    /// No previous frame cached.
    Bootstrap,
    /// A previous frame is cached and the next call yields flow.
    Tracking,
}

/// Sparse odometry over consecutive frames.
///
/// Holds the previous frame's features between calls. A call builds the
/// current frame's stack locally and commits it only at the end, so a call
/// that is abandoned midway leaves the cache as it was.
pub struct VisualOdometry {
    config: OdometryConfig,
    pattern: Arc<DescriptorPattern>,
    previous: Option<FeatureStack>,
}

impl VisualOdometry {
    pub fn new(config: OdometryConfig, pattern: Arc<DescriptorPattern>) -> Self {
        Self {
            config,
            pattern,
            previous: None,
        }
    }

    pub fn config(&self) -> &OdometryConfig {
        &self.config
    }

    pub fn pattern(&self) -> &Arc<DescriptorPattern> {
        &self.pattern
    }

    pub fn state(&self) -> OdometryState {
        match self.previous {
            Some(_) => OdometryState::Tracking,
            None => OdometryState::Bootstrap,
        }
    }

    /// Drop the cached frame. The next call bootstraps.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Match `img` against the cached frame and cache it for the next call.
    ///
    /// Corners are searched from `start_row` down. Each current feature takes
    /// the first still-unmatched previous feature whose match score is below
    /// `match_threshold`; this is greedy, not a best-match search. A taken
    /// previous feature cannot match again. Previous features left over at
    /// the end are retired.
    pub fn process(
        &mut self,
        img: &GrayImage,
        start_row: u32,
        detector: &dyn CornerDetector,
        mapper: &dyn GroundMapper,
    ) -> OdometryFrame {
        let (current, n_unexamined) = self.describe_frame(img, start_row, detector);
        let n_features = current.len();

        let Some(mut previous) = self.previous.take() else {
            tracing::debug!("odometry: bootstrap with {} features", n_features);
            self.previous = Some(current);
            return OdometryFrame {
                n_features,
                n_unexamined,
                bootstrap: true,
                ..OdometryFrame::default()
            };
        };

        let threshold = self.config.match_threshold;
        let mut flow = Vec::new();
        let mut n_matched = 0usize;
        for (_, feature) in current.iter_live() {
            let hit = previous
                .iter_live()
                .find(|(_, p)| {
                    match_score(&feature.descriptor, &p.descriptor, threshold) < threshold
                })
                .map(|(i, _)| i);
            let Some(i) = hit else { continue };
            if let Ok(Some(partner)) = previous.take(i) {
                n_matched += 1;
                match FlowVector::between(&partner, feature, mapper) {
                    Some(v) => flow.push(v),
                    None => tracing::trace!(
                        "odometry: match {:?} -> {:?} not projectable",
                        partner.position,
                        feature.position
                    ),
                }
            }
        }
        let n_retired_unmatched = previous.retire_all();
        self.previous = Some(current);

        tracing::debug!(
            "odometry: {} features, {} matched, {} flow vectors, {} retired unmatched",
            n_features,
            n_matched,
            flow.len(),
            n_retired_unmatched
        );
        OdometryFrame {
            flow,
            n_features,
            n_matched,
            n_retired_unmatched,
            n_unexamined,
            bootstrap: false,
        }
    }

    fn describe_frame(
        &self,
        img: &GrayImage,
        start_row: u32,
        detector: &dyn CornerDetector,
    ) -> (FeatureStack, usize) {
        let mut stack = FeatureStack::with_capacity(self.config.stack_size);
        let (w, h) = img.dimensions();
        if start_row >= h {
            return (stack, 0);
        }
        let region = image::imageops::crop_imm(img, 0, start_row, w, h - start_row).to_image();
        let keypoints = detector.detect(&region);

        for (i, &[x, y]) in keypoints.iter().enumerate() {
            let position = [x, y + start_row];
            let Some(descriptor) = BinaryDescriptor::compute(img, position, &self.pattern) else {
                continue;
            };
            let feature = Feature {
                position,
                descriptor,
            };
            if stack.push(feature).is_err() {
                let unexamined = keypoints.len() - i;
                tracing::debug!(
                    "odometry: feature stack full at {}, {} keypoints left out",
                    stack.capacity(),
                    unexamined
                );
                return (stack, unexamined);
            }
        }
        (stack, 0)
    }
}
