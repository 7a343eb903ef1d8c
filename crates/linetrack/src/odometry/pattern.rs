//! Randomized BRIEF sampling pattern.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Reasons a [`DescriptorPattern`] cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Window side outside `[2, 255]`.
    InvalidWindow(u32),
    /// A pair coordinate lies outside the window.
    PairOutsideWindow { index: usize, window: u32 },
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWindow(w) => write!(f, "descriptor window ({}) must be in [2, 255]", w),
            Self::PairOutsideWindow { index, window } => {
                write!(f, "sampling pair {} outside a {}px window", index, window)
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// One intensity comparison: pixel `(x1, y1)` against `(x2, y2)`, both in
/// window coordinates `[0, window)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SamplingPair {
    pub x1: u8,
    pub y1: u8,
    pub x2: u8,
    pub y2: u8,
}

/// Fixed set of comparison pairs shared by every descriptor of a run.
///
/// Pairs are drawn coarse to fine: the second point of a pair sits at a
/// random angle and a distance drawn from an annulus that shrinks every 32
/// pairs, so early bits compare distant pixels and later bits nearby ones.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DescriptorPattern {
    window: u32,
    pairs: Vec<SamplingPair>,
}

impl DescriptorPattern {
    /// Draw `length` pairs inside a `window × window` patch.
    ///
    /// `window` must be in `[2, 255]`.
    pub fn generate(length: usize, window: u32, rng: &mut impl Rng) -> Result<Self, PatternError> {
        if !(2..=255).contains(&window) {
            return Err(PatternError::InvalidWindow(window));
        }
        let w = window as i32;
        let mut dist_max = ((2.0f64).sqrt() * window as f64) as i32;
        let mut dist_min = dist_max / 2;

        let mut pairs = Vec::with_capacity(length);
        for i in 0..length {
            let x1 = rng.gen_range(0..w);
            let y1 = rng.gen_range(0..w);
            if i % 32 == 0 && dist_min > 4 {
                dist_min /= 2;
                dist_max -= dist_min;
            }
            let (x2, y2) = loop {
                let dist = rng.gen_range(dist_min as f64..=dist_max as f64);
                let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                let x2 = x1 + (angle.cos() * dist) as i32;
                let y2 = y1 + (angle.sin() * dist) as i32;
                if (0..w).contains(&x2) && (0..w).contains(&y2) {
                    break (x2, y2);
                }
            };
            pairs.push(SamplingPair {
                x1: x1 as u8,
                y1: y1 as u8,
                x2: x2 as u8,
                y2: y2 as u8,
            });
        }
        Ok(Self { window, pairs })
    }

    /// Pattern from explicit pairs, all coordinates in `[0, window)`.
    pub fn from_pairs(window: u32, pairs: Vec<SamplingPair>) -> Result<Self, PatternError> {
        if !(2..=255).contains(&window) {
            return Err(PatternError::InvalidWindow(window));
        }
        for (index, p) in pairs.iter().enumerate() {
            if [p.x1, p.y1, p.x2, p.y2].iter().any(|&c| c as u32 >= window) {
                return Err(PatternError::PairOutsideWindow { index, window });
            }
        }
        Ok(Self { window, pairs })
    }

    /// Deterministic pattern for `Some(seed)`, OS entropy otherwise.
    pub fn with_seed(length: usize, window: u32, seed: Option<u64>) -> Result<Self, PatternError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::generate(length, window, &mut rng)
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn pairs(&self) -> &[SamplingPair] {
        &self.pairs
    }

    /// Descriptor length in bits.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Packed descriptor size in bytes.
    pub fn n_bytes(&self) -> usize {
        self.pairs.len().div_ceil(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_dist(p: &SamplingPair) -> f64 {
        let dx = p.x2 as f64 - p.x1 as f64;
        let dy = p.y2 as f64 - p.y1 as f64;
        (dx * dx + dy * dy).sqrt()
    }

    #[test]
    fn pairs_stay_inside_window() {
        let pat = DescriptorPattern::with_seed(256, 24, Some(1)).unwrap();
        assert_eq!(pat.len(), 256);
        assert_eq!(pat.n_bytes(), 32);
        for p in pat.pairs() {
            for c in [p.x1, p.y1, p.x2, p.y2] {
                assert!((c as u32) < 24);
            }
            assert_ne!((p.x1, p.y1), (p.x2, p.y2));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = DescriptorPattern::with_seed(128, 24, Some(99)).unwrap();
        let b = DescriptorPattern::with_seed(128, 24, Some(99)).unwrap();
        let c = DescriptorPattern::with_seed(128, 24, Some(100)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rejects_bad_window_and_pairs() {
        assert_eq!(
            DescriptorPattern::with_seed(256, 300, Some(1)).unwrap_err(),
            PatternError::InvalidWindow(300)
        );
        assert_eq!(
            DescriptorPattern::with_seed(256, 1, Some(1)).unwrap_err(),
            PatternError::InvalidWindow(1)
        );
        let inside = SamplingPair {
            x1: 0,
            y1: 1,
            x2: 9,
            y2: 3,
        };
        let outside = SamplingPair { y1: 10, ..inside };
        assert!(DescriptorPattern::from_pairs(10, vec![inside]).is_ok());
        assert_eq!(
            DescriptorPattern::from_pairs(10, vec![inside, outside]).unwrap_err(),
            PatternError::PairOutsideWindow {
                index: 1,
                window: 10
            }
        );
    }

    #[test]
    fn coarse_to_fine_distances() {
        // window 24: dist_max = 33, dist_min = 16 -> [8, 25] for pairs 0..32,
        // [4, 21] from pair 32 on (dist_min stops halving at 4).
        let pat = DescriptorPattern::with_seed(256, 24, Some(5)).unwrap();
        let first: f64 = pat.pairs()[..32].iter().map(pair_dist).sum::<f64>() / 32.0;
        let last: f64 = pat.pairs()[224..].iter().map(pair_dist).sum::<f64>() / 32.0;
        assert!(first > last, "first block {first:.1} vs last block {last:.1}");
        for p in &pat.pairs()[32..] {
            // Truncation toward zero can shave up to one pixel per axis.
            assert!(pair_dist(p) <= 21.0 + 1e-9);
            assert!(pair_dist(p) >= 4.0 - std::f64::consts::SQRT_2);
        }
    }
}
