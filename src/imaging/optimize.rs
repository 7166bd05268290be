//! Quality-driven optimization of the final buffer.
//!
//! At quality 100 the buffer passes through untouched. Below that, the
//! alpha channel is flattened onto an opaque white background, matching
//! what the JPEG save path composes anyway. The quality scalar itself
//! does not lossy-compress the in-memory pixels; real quality reduction
//! happens at encode time in the result sink.

use image::{Rgb, RgbImage, Rgba, RgbaImage};

/// Apply the optimization pass for the given quality setting.
///
/// `quality >= 100` returns the input unchanged (moved, not copied).
#[must_use]
pub fn optimize(image: RgbaImage, quality: u8) -> RgbaImage {
    if quality >= 100 {
        return image;
    }
    flatten_onto_white(&image)
}

/// Composite the image over an opaque white background, keeping RGBA.
#[must_use]
fn flatten_onto_white(image: &RgbaImage) -> RgbaImage {
    let mut out = RgbaImage::new(image.width(), image.height());
    for (dst, src) in out.pixels_mut().zip(image.pixels()) {
        let [r, g, b] = blend_over_white(src);
        *dst = Rgba([r, g, b, 255]);
    }
    out
}

/// Drop the alpha channel by compositing over white, for JPEG encoding.
#[must_use]
pub fn flatten_to_rgb(image: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(image.width(), image.height());
    for (dst, src) in out.pixels_mut().zip(image.pixels()) {
        *dst = Rgb(blend_over_white(src));
    }
    out
}

fn blend_over_white(pixel: &Rgba<u8>) -> [u8; 3] {
    let alpha = u32::from(pixel[3]);
    let inverse = 255 - alpha;
    [
        ((u32::from(pixel[0]) * alpha + 255 * inverse) / 255) as u8,
        ((u32::from(pixel[1]) * alpha + 255 * inverse) / 255) as u8,
        ((u32::from(pixel[2]) * alpha + 255 * inverse) / 255) as u8,
    ]
}
