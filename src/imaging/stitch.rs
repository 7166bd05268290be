//! Horizontal band stitching of source images into one panorama.
//!
//! The output width is partitioned into N equal bands; each source image
//! is resized to its band and copied verbatim, left to right, in input
//! order. There is no seam blending and no feature alignment: the cost
//! is O(N * band area) and the result is fully deterministic, which is
//! what the viewer pipeline expects.

use image::{imageops, RgbaImage};

use crate::imaging::resize::resize;
use crate::{Error, Result};

/// Stitch `images` into an `output_width x output_height` panorama.
///
/// A single image takes the identity path: it is resized to the output
/// dimensions with no band arithmetic involved. With N > 1 images,
/// `output_width / N` columns go to each band and any remainder columns
/// on the right edge stay zeroed.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `images` is empty, or if there are
/// more images than output columns (bands would be zero pixels wide).
pub fn stitch(images: &[RgbaImage], output_width: u32, output_height: u32) -> Result<RgbaImage> {
    if images.is_empty() {
        return Err(Error::InvalidInput("image list must not be empty".into()));
    }

    if images.len() == 1 {
        return Ok(resize(&images[0], output_width, output_height));
    }

    let count = images.len() as u32;
    let band_width = output_width / count;
    if band_width == 0 {
        return Err(Error::InvalidInput(format!(
            "{} images do not fit in {} output columns",
            count, output_width
        )));
    }

    let mut panorama = RgbaImage::new(output_width, output_height);
    let mut x = 0i64;
    for image in images {
        let band = resize(image, band_width, output_height);
        imageops::replace(&mut panorama, &band, x, 0);
        x += i64::from(band_width);
    }

    Ok(panorama)
}
