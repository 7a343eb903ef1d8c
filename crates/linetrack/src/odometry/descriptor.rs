//! Binary descriptors and early-exit Hamming scoring.

use image::GrayImage;

use super::pattern::DescriptorPattern;

/// Word used for XOR + popcount.
type BitBlock = u64;
const BLOCK_BYTES: usize = std::mem::size_of::<BitBlock>();

/// Packed comparison bits, most significant bit first within each byte, in
/// pattern order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BinaryDescriptor {
    bytes: Vec<u8>,
}

impl BinaryDescriptor {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Describe the patch centred on `keypoint`.
    ///
    /// Returns `None` when the keypoint is closer than `pattern.window()` to
    /// any image border.
    pub fn compute(
        img: &GrayImage,
        keypoint: [u32; 2],
        pattern: &DescriptorPattern,
    ) -> Option<Self> {
        let window = pattern.window();
        if !has_margin(img.dimensions(), keypoint, window) {
            return None;
        }
        let half = window / 2;
        let ox = keypoint[0] - half;
        let oy = keypoint[1] - half;
        let at = |x: u8, y: u8| img.get_pixel(ox + x as u32, oy + y as u32)[0];

        let mut bytes = Vec::with_capacity(pattern.n_bytes());
        let mut acc = 0u8;
        let mut n_bits = 0u32;
        for p in pattern.pairs() {
            acc <<= 1;
            if at(p.x2, p.y2) > at(p.x1, p.y1) {
                acc |= 1;
            }
            n_bits += 1;
            if n_bits == 8 {
                bytes.push(acc);
                acc = 0;
                n_bits = 0;
            }
        }
        if n_bits > 0 {
            bytes.push(acc << (8 - n_bits));
        }
        Some(Self { bytes })
    }
}

/// True if `keypoint` is at least `margin` pixels away from every border.
pub fn has_margin(dims: (u32, u32), keypoint: [u32; 2], margin: u32) -> bool {
    let (w, h) = dims;
    let [x, y] = keypoint;
    x >= margin
        && y >= margin
        && x.checked_add(margin).is_some_and(|r| r < w)
        && y.checked_add(margin).is_some_and(|b| b < h)
}

fn block(bytes: &[u8]) -> BitBlock {
    let mut buf = [0u8; BLOCK_BYTES];
    buf.copy_from_slice(bytes);
    BitBlock::from_be_bytes(buf)
}

/// Hamming distance between `a` and `b`, abandoned once it reaches
/// `threshold`.
///
/// Below `threshold` the result is exact; at or above it, only the fact that
/// it is `>= threshold` is meaningful. Both descriptors must come from the
/// same pattern (equal length).
pub fn match_score(a: &BinaryDescriptor, b: &BinaryDescriptor, threshold: u32) -> u32 {
    debug_assert_eq!(a.bytes.len(), b.bytes.len());
    let mut dist = 0u32;
    let mut wa = a.bytes.chunks_exact(BLOCK_BYTES);
    let mut wb = b.bytes.chunks_exact(BLOCK_BYTES);
    for (x, y) in (&mut wa).zip(&mut wb) {
        dist += (block(x) ^ block(y)).count_ones();
        if dist >= threshold {
            return dist;
        }
    }
    for (x, y) in wa.remainder().iter().zip(wb.remainder()) {
        dist += (x ^ y).count_ones();
        if dist >= threshold {
            return dist;
        }
    }
    dist
}

/// Full Hamming distance.
pub fn hamming_distance(a: &BinaryDescriptor, b: &BinaryDescriptor) -> u32 {
    match_score(a, b, u32::MAX)
}
