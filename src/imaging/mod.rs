//! Pixel stages of the panorama pipeline.
//!
//! Each stage either consumes its input or produces a fresh buffer;
//! buffers are never shared across concurrent stages. All stages operate
//! on [`image::RgbaImage`] and are pure functions of their inputs, so
//! they can be tested in isolation from the task machinery.

pub mod optimize;
pub mod resize;
pub mod sphere;
pub mod stitch;

pub use optimize::{flatten_to_rgb, optimize};
pub use resize::resize;
pub use sphere::project;
pub use stitch::stitch;
