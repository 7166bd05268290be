//! Task creation request and processing options.
//!
//! These are the wire shapes a caller submits to start a pipeline run.
//! Validation happens up front in [`ProcessingRequest::validate`] so no
//! work is scheduled for a request that can never succeed.

use serde::{Deserialize, Serialize};

use crate::project::ProjectId;
use crate::{Error, Result};

/// The kind of VR output to generate.
///
/// Only panorama generation is implemented. Cube and sphere map
/// requests are accepted on the wire but rejected at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingType {
    Panorama,
    CubeMap,
    SphereMap,
}

impl Default for ProcessingType {
    fn default() -> Self {
        Self::Panorama
    }
}

impl std::fmt::Display for ProcessingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingType::Panorama => write!(f, "PANORAMA"),
            ProcessingType::CubeMap => write!(f, "CUBE_MAP"),
            ProcessingType::SphereMap => write!(f, "SPHERE_MAP"),
        }
    }
}

/// Tunable parameters for one pipeline run. Immutable once a task starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOptions {
    /// Output panorama width in pixels.
    #[serde(default = "default_output_width")]
    pub output_width: u32,
    /// Output panorama height in pixels.
    #[serde(default = "default_output_height")]
    pub output_height: u32,
    /// JPEG quality, 0-100. At 100 the optimizer pass is an identity.
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Whether to run the optimizer stage before saving.
    #[serde(default = "default_enable_optimization")]
    pub enable_optimization: bool,
}

fn default_output_width() -> u32 {
    4096
}

fn default_output_height() -> u32 {
    2048
}

fn default_quality() -> u8 {
    90
}

fn default_enable_optimization() -> bool {
    true
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            output_width: default_output_width(),
            output_height: default_output_height(),
            quality: default_quality(),
            enable_optimization: default_enable_optimization(),
        }
    }
}

/// A request to generate a VR panorama for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingRequest {
    /// The project the panorama belongs to.
    pub project_id: ProjectId,
    /// Ordered source image references, stitched left to right.
    pub image_urls: Vec<String>,
    /// Output kind; defaults to panorama.
    #[serde(default)]
    pub processing_type: ProcessingType,
    /// Pipeline options; defaults apply when omitted.
    #[serde(default)]
    pub options: ProcessingOptions,
}

impl ProcessingRequest {
    /// Create a panorama request with default options.
    pub fn new(project_id: ProjectId, image_urls: Vec<String>) -> Self {
        Self {
            project_id,
            image_urls,
            processing_type: ProcessingType::default(),
            options: ProcessingOptions::default(),
        }
    }

    /// Reject requests that can never succeed, before any work starts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty image list,
    /// non-positive output dimensions, an out-of-range quality, or an
    /// unimplemented processing type.
    pub fn validate(&self) -> Result<()> {
        if self.image_urls.is_empty() {
            return Err(Error::InvalidInput("image list must not be empty".into()));
        }
        if self.options.output_width == 0 || self.options.output_height == 0 {
            return Err(Error::InvalidInput(
                "output dimensions must be positive".into(),
            ));
        }
        if self.options.quality > 100 {
            return Err(Error::InvalidInput(format!(
                "quality must be 0-100, got {}",
                self.options.quality
            )));
        }
        if self.processing_type != ProcessingType::Panorama {
            return Err(Error::InvalidInput(format!(
                "processing type {} is not supported",
                self.processing_type
            )));
        }
        Ok(())
    }
}
