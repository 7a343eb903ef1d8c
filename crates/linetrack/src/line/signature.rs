//! Row-wise edge signatures.
//!
//! Each sampled row is filtered with a 3×3 horizontal-gradient kernel
//! (`[-1 0 1]` on three rows). A dark line on a light floor produces a
//! strong negative response at its left edge followed by a strong positive
//! response at its right edge; the midpoint of that pair is the line centre
//! for the row.

use image::GrayImage;

use crate::config::{LineConfig, TrackPolarity};
use crate::geometry::GroundMapper;

/// Candidate points for one frame: one entry per sampled row, `None` where
/// no acceptable signature was found.
pub type CandidateSet = Vec<Option<[f64; 2]>>;

/// Extremum pair found in a row response profile.
///
/// Values are polarity-normalised: `min` is the (negative) leading edge and
/// `max` the (positive) trailing edge, whatever the track contrast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RowSignature {
    pub min_index: usize,
    pub max_index: usize,
    pub min: i32,
    pub max: i32,
}

impl RowSignature {
    pub fn score(&self) -> i32 {
        self.min.abs() + self.max.abs()
    }

    /// Column distance between the two edges.
    pub fn width(&self) -> usize {
        self.max_index - self.min_index
    }

    pub fn center(&self) -> f64 {
        (self.max_index + self.min_index) as f64 / 2.0
    }

    /// Strength and width gates.
    pub fn is_accepted(&self, config: &LineConfig) -> bool {
        self.score() > config.score_threshold && self.width() < config.width_threshold as usize
    }
}

/// Scan result for one sampled row, in pixel space.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RowSample {
    /// Image row index.
    pub row: u32,
    /// Extremum pair, if the state machine found one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<RowSignature>,
    /// Line centre column; present only when the signature passed the gates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<f64>,
}

/// Row indices sampled for an image of the given height.
///
/// Rows are `first_line + i * ((height - first_line) / nb_lines_sampled)`.
pub fn sampled_rows(height: u32, config: &LineConfig) -> Vec<u32> {
    let n = config.nb_lines_sampled as u32;
    if n == 0 || height <= config.first_line {
        return Vec::new();
    }
    let spacing = (height - config.first_line) / n;
    (0..n).map(|i| config.first_line + i * spacing).collect()
}

/// Horizontal gradient response along row `v`.
///
/// `out[i] = Σ_{dy=-1..=1} I(i+1, v+dy) − I(i-1, v+dy)`; the two border
/// columns are 0. Returns `None` if `v` has no neighbour row on either side.
pub fn row_response(img: &GrayImage, v: u32) -> Option<Vec<i32>> {
    let (w, h) = img.dimensions();
    if v == 0 || v + 1 >= h || w < 3 {
        return None;
    }
    let w = w as usize;
    let data = img.as_raw();
    let rows = [
        &data[(v as usize - 1) * w..v as usize * w],
        &data[v as usize * w..(v as usize + 1) * w],
        &data[(v as usize + 1) * w..(v as usize + 2) * w],
    ];

    let mut out = vec![0i32; w];
    for (i, resp) in out.iter_mut().enumerate().take(w - 1).skip(1) {
        *resp = rows
            .iter()
            .map(|r| r[i + 1] as i32 - r[i - 1] as i32)
            .sum();
    }
    Some(out)
}

/// Find the leading/trailing extremum pair in a response profile.
///
/// Scans left to right keeping a running minimum and maximum. A maximum is
/// only tracked once a negative minimum has been seen; a new lower minimum
/// discards any maximum found before it.
pub fn find_signature(profile: &[i32], polarity: TrackPolarity) -> Option<RowSignature> {
    if profile.len() < 3 {
        return None;
    }
    let sign = polarity.sign();
    let (mut min, mut max) = (0i32, 0i32);
    let (mut min_index, mut max_index) = (0usize, 0usize);
    let mut found = false;

    for (j, &raw) in profile.iter().enumerate().take(profile.len() - 1).skip(1) {
        let r = sign * raw;
        if r > max && min < 0 {
            max = r;
            max_index = j;
            found = true;
        }
        if r < min {
            if max > 0 {
                max = 0;
                found = false;
            }
            min = r;
            min_index = j;
        }
    }

    found.then_some(RowSignature {
        min_index,
        max_index,
        min,
        max,
    })
}

/// Scan every sampled row of `img`.
///
/// The output has exactly `config.nb_lines_sampled` entries when the image is
/// taller than `first_line`; rows are independent of each other.
pub fn scan_rows(img: &GrayImage, config: &LineConfig) -> Vec<RowSample> {
    sampled_rows(img.height(), config)
        .into_iter()
        .map(|row| {
            let signature =
                row_response(img, row).and_then(|p| find_signature(&p, config.polarity));
            let column = signature
                .filter(|s| s.is_accepted(config))
                .map(|s| s.center());
            RowSample {
                row,
                signature,
                column,
            }
        })
        .collect()
}

/// Project accepted row centres onto the ground plane.
pub fn candidate_points(samples: &[RowSample], mapper: &dyn GroundMapper) -> CandidateSet {
    samples
        .iter()
        .map(|s| {
            let u = s.column?;
            mapper.pixel_to_ground([u, s.row as f64])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GroundProjection;
    use crate::test_utils::draw_vertical_band;

    fn profile_with(len: usize, entries: &[(usize, i32)]) -> Vec<i32> {
        let mut p = vec![0; len];
        for &(i, v) in entries {
            p[i] = v;
        }
        p
    }

    #[test]
    fn single_signature_center() {
        let p = profile_with(100, &[(40, -220), (60, 230)]);
        let sig = find_signature(&p, TrackPolarity::DarkLine).expect("signature");
        assert_eq!(sig.min_index, 40);
        assert_eq!(sig.max_index, 60);
        assert_eq!(sig.score(), 450);
        assert_eq!(sig.width(), 20);
        assert_eq!(sig.center(), 50.0);

        let cfg = LineConfig {
            score_threshold: 200,
            width_threshold: 100,
            ..LineConfig::default()
        };
        assert!(sig.is_accepted(&cfg));
    }

    #[test]
    fn positive_before_negative_is_not_a_dark_line() {
        let p = profile_with(100, &[(40, 230), (60, -220)]);
        assert!(find_signature(&p, TrackPolarity::DarkLine).is_none());
        let sig = find_signature(&p, TrackPolarity::LightLine).expect("light line");
        assert_eq!(sig.center(), 50.0);
        assert_eq!(sig.min, -230);
        assert_eq!(sig.max, 220);
    }

    #[test]
    fn lower_minimum_resets_maximum() {
        let p = profile_with(120, &[(10, -100), (20, 150), (50, -300), (70, 310)]);
        let sig = find_signature(&p, TrackPolarity::DarkLine).unwrap();
        assert_eq!((sig.min_index, sig.max_index), (50, 70));

        // Lower minimum with nothing after it: no signature.
        let p = profile_with(120, &[(10, -100), (20, 150), (50, -300)]);
        assert!(find_signature(&p, TrackPolarity::DarkLine).is_none());
    }

    #[test]
    fn gates_reject_weak_and_wide() {
        let cfg = LineConfig::default();
        let weak_profile = profile_with(100, &[(40, -50), (60, 60)]);
        let weak = find_signature(&weak_profile, TrackPolarity::DarkLine).unwrap();
        assert!(!weak.is_accepted(&cfg));
        let wide_profile = profile_with(300, &[(10, -300), (250, 300)]);
        let wide = find_signature(&wide_profile, TrackPolarity::DarkLine).unwrap();
        assert!(!wide.is_accepted(&cfg));
    }

    #[test]
    fn response_of_dark_band() {
        let img = draw_vertical_band(64, 16, 30, 8, 200, 40);
        let resp = row_response(&img, 5).unwrap();
        assert_eq!(resp[0], 0);
        assert_eq!(resp[63], 0);
        assert_eq!(resp[29], -480);
        assert_eq!(resp[37], 480);
        assert!(row_response(&img, 0).is_none());
        assert!(row_response(&img, 15).is_none());
    }

    #[test]
    fn sampled_rows_spacing() {
        let cfg = LineConfig::default();
        let rows = sampled_rows(240, &cfg);
        assert_eq!(rows.len(), 16);
        assert_eq!(rows[0], 8);
        assert_eq!(rows[1], 22);
        assert_eq!(rows[15], 8 + 15 * 14);
        assert!(sampled_rows(4, &cfg).is_empty());
    }

    #[test]
    fn scan_finds_band_in_every_row() {
        let img = draw_vertical_band(160, 120, 70, 8, 200, 40);
        let cfg = LineConfig::default();
        let samples = scan_rows(&img, &cfg);
        assert_eq!(samples.len(), 16);
        for s in &samples {
            // Falling edge at column 69, rising edge at column 77.
            assert_eq!(s.column, Some(73.0), "row {}", s.row);
        }
        let pts = candidate_points(&samples, &GroundProjection::identity());
        assert!(pts.iter().all(|p| p.is_some()));
        assert_eq!(pts[0], Some([73.0, 8.0]));
    }

    #[test]
    fn flat_image_has_no_candidates() {
        let img = GrayImage::from_pixel(80, 60, image::Luma([128]));
        let samples = scan_rows(&img, &LineConfig::default());
        assert!(samples.iter().all(|s| s.signature.is_none() && s.column.is_none()));
    }
}
