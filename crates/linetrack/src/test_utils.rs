//! Shared synthetic-image helpers for unit tests.

use image::{GrayImage, Luma};
use nalgebra::Matrix3;
use rand::prelude::*;

use crate::geometry::{GroundMapper, GroundProjection};

/// Uniform floor with a vertical band of `width` columns starting at `left`.
pub(crate) fn draw_vertical_band(
    w: u32,
    h: u32,
    left: u32,
    width: u32,
    floor_pix: u8,
    line_pix: u8,
) -> GrayImage {
    GrayImage::from_fn(w, h, |x, _| {
        if x >= left && x < left + width {
            Luma([line_pix])
        } else {
            Luma([floor_pix])
        }
    })
}

/// Affine projection where image rows count forward distance from the
/// bottom edge and columns count lateral offset from the centre column:
/// `u = w/2 − y`, `v = h − x`.
pub(crate) fn rows_forward_projection(w: u32, h: u32) -> GroundProjection {
    #[rustfmt::skip]
    let m = Matrix3::new(
        0.0, -1.0, w as f64 / 2.0,
        -1.0, 0.0, h as f64,
        0.0, 0.0, 1.0,
    );
    GroundProjection::from_ground_to_pixel(m).expect("invertible")
}

/// Render a band of `width` pixels centred on the ground curve
/// `y = lateral(x)`, one image row at a time.
pub(crate) fn draw_curved_line(
    w: u32,
    h: u32,
    proj: &GroundProjection,
    lateral: impl Fn(f64) -> f64,
    width: u32,
    floor_pix: u8,
    line_pix: u8,
) -> GrayImage {
    let mut img = GrayImage::from_pixel(w, h, Luma([floor_pix]));
    for v in 0..h {
        let Some([gx, _]) = proj.pixel_to_ground([w as f64 / 2.0, v as f64]) else {
            continue;
        };
        let Some([uc, _]) = proj.ground_to_pixel([gx, lateral(gx)]) else {
            continue;
        };
        let left = (uc - width as f64 / 2.0 + 0.5).round();
        for i in 0..width as i64 {
            let u = left as i64 + i;
            if u >= 0 && u < w as i64 {
                img.put_pixel(u as u32, v, Luma([line_pix]));
            }
        }
    }
    img
}

/// Uniform random texture.
pub(crate) fn noise_image(w: u32, h: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    GrayImage::from_fn(w, h, |_, _| Luma([rng.gen::<u8>()]))
}

/// Copy of `img` shifted right by `dx` and down by `dy`; uncovered pixels
/// are filled with `fill`.
pub(crate) fn shift_image(img: &GrayImage, dx: i64, dy: i64, fill: u8) -> GrayImage {
    let (w, h) = img.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let sx = x as i64 - dx;
        let sy = y as i64 - dy;
        if sx >= 0 && sy >= 0 && sx < w as i64 && sy < h as i64 {
            *img.get_pixel(sx as u32, sy as u32)
        } else {
            Luma([fill])
        }
    })
}
