//! Keypoint proposal.

use image::GrayImage;
use imageproc::corners::{corners_fast9, Corner};

/// Source of candidate keypoints for the odometry.
///
/// Returned positions are in the coordinates of `img`; order is not
/// significant.
pub trait CornerDetector {
    fn detect(&self, img: &GrayImage) -> Vec<[u32; 2]>;
}

/// FAST-9 segment test with optional non-maximum suppression.
#[derive(Debug, Clone, Copy)]
pub struct Fast9Detector {
    pub threshold: u8,
    /// Suppression radius; `0` keeps every corner.
    pub nonmax_radius: u32,
}

impl Fast9Detector {
    pub fn new(threshold: u8, nonmax_radius: u32) -> Self {
        Self {
            threshold,
            nonmax_radius,
        }
    }
}

impl CornerDetector for Fast9Detector {
    fn detect(&self, img: &GrayImage) -> Vec<[u32; 2]> {
        let mut corners = corners_fast9(img, self.threshold);
        if self.nonmax_radius > 0 {
            corners = imageproc::suppress::local_maxima(&corners, self.nonmax_radius);
        }
        let mut out: Vec<[u32; 2]> = corners
            .into_iter()
            .map(|Corner { x, y, .. }| [x, y])
            .collect();
        // Row-major order keeps the feature stack reproducible.
        out.sort_unstable_by_key(|&[x, y]| (y, x));
        out
    }
}
