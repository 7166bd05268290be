//! Spherical remapping of an equirectangular panorama.
//!
//! Every destination pixel is mapped to spherical coordinates, pushed
//! through the unit sphere and inverted back into the same panorama:
//! a pole-warped nearest-sample remap of the original image. The two
//! transforms are near-inverses of each other, which is exactly what
//! downstream viewers were calibrated against, so the formulas must not
//! change (no bilinear sampling, no half-pixel offsets).

use std::f64::consts::PI;

use image::RgbaImage;

/// Remap `panorama` through the spherical coordinate transform.
///
/// The output has the same dimensions as the input. Source lookups are
/// truncated to integers and clamped to `[0, dim - 1]`, so the pass
/// never reads outside the buffer for any input of at least 1x1.
#[must_use]
pub fn project(panorama: &RgbaImage) -> RgbaImage {
    let (width, height) = panorama.dimensions();
    let w = f64::from(width);
    let h = f64::from(height);

    let mut out = RgbaImage::new(width, height);
    for y in 0..height {
        // Latitude in [0, pi).
        let phi = f64::from(y) / h * PI;
        for x in 0..width {
            // Longitude in [0, 2*pi).
            let theta = f64::from(x) / w * 2.0 * PI;

            // Onto the unit sphere.
            let cart_x = phi.sin() * theta.cos();
            let cart_y = phi.cos();
            let cart_z = phi.sin() * theta.sin();

            // And back into panorama coordinates.
            let source_x = (cart_z.atan2(cart_x) + PI) / (2.0 * PI) * w;
            let source_y = cart_y.acos() / PI * h;

            let sx = (source_x as i64).clamp(0, i64::from(width) - 1) as u32;
            let sy = (source_y as i64).clamp(0, i64::from(height) - 1) as u32;

            out.put_pixel(x, y, *panorama.get_pixel(sx, sy));
        }
    }
    out
}
