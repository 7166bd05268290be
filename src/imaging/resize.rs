//! Bilinear image resizing.
//!
//! Source coordinates are destination indices scaled by
//! `source_dim / target_dim`; each destination pixel blends the four
//! nearest source pixels with standard bilinear weights. Edge pixels
//! clamp to the buffer boundary rather than wrapping or extrapolating.

use image::{Rgba, RgbaImage};

/// Resize `src` to `target_width x target_height` with bilinear sampling.
///
/// Target dimensions must be positive; requests are validated before any
/// stage runs, so this is asserted rather than returned as an error.
#[must_use]
pub fn resize(src: &RgbaImage, target_width: u32, target_height: u32) -> RgbaImage {
    debug_assert!(target_width > 0 && target_height > 0);

    let (src_width, src_height) = src.dimensions();
    let x_ratio = f64::from(src_width) / f64::from(target_width);
    let y_ratio = f64::from(src_height) / f64::from(target_height);

    let mut out = RgbaImage::new(target_width, target_height);
    for y in 0..target_height {
        let sy = f64::from(y) * y_ratio;
        let y0 = (sy.floor() as u32).min(src_height - 1);
        let y1 = (y0 + 1).min(src_height - 1);
        let wy = sy - f64::from(y0);

        for x in 0..target_width {
            let sx = f64::from(x) * x_ratio;
            let x0 = (sx.floor() as u32).min(src_width - 1);
            let x1 = (x0 + 1).min(src_width - 1);
            let wx = sx - f64::from(x0);

            let p00 = src.get_pixel(x0, y0);
            let p10 = src.get_pixel(x1, y0);
            let p01 = src.get_pixel(x0, y1);
            let p11 = src.get_pixel(x1, y1);

            let mut blended = [0u8; 4];
            for c in 0..4 {
                let top = f64::from(p00[c]) * (1.0 - wx) + f64::from(p10[c]) * wx;
                let bottom = f64::from(p01[c]) * (1.0 - wx) + f64::from(p11[c]) * wx;
                blended[c] = (top * (1.0 - wy) + bottom * wy).round() as u8;
            }
            out.put_pixel(x, y, Rgba(blended));
        }
    }
    out
}
