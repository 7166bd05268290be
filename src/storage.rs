//! Image input and result output collaborators.
//!
//! The pipeline does not decide how images are stored; it consumes an
//! [`ImageSource`] to turn an opaque reference into pixels and a
//! [`ResultSink`] to persist the finished panorama and hand back a
//! public URL. The filesystem implementations here mirror the upload
//! layout the rest of the system serves: a public base URL mapped onto
//! an upload root, with results under `vr/project_{id}/`.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbaImage};

use crate::imaging::flatten_to_rgb;
use crate::project::ProjectId;
use crate::task::TaskId;
use crate::{plog_debug, Error, Result};

/// Resolve an opaque image reference to decoded pixels.
pub trait ImageSource: Send + Sync {
    /// Read and decode the referenced image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageNotFound`] if the reference does not resolve
    /// and [`Error::Image`] if the bytes cannot be decoded.
    fn read(&self, reference: &str) -> Result<RgbaImage>;
}

/// Persist a finished panorama and return its public URL.
pub trait ResultSink: Send + Sync {
    /// Save `image` for the given project and task at the given JPEG
    /// quality, returning the public URL of the stored result.
    fn save(
        &self,
        image: &RgbaImage,
        project: ProjectId,
        task: TaskId,
        quality: u8,
    ) -> Result<String>;
}

/// Reads images from the upload directory that the public base URL maps to.
pub struct FsImageSource {
    upload_root: PathBuf,
    base_url: String,
}

impl FsImageSource {
    pub fn new(upload_root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            upload_root: upload_root.into(),
            base_url: base_url.to_string(),
        }
    }

    /// Map a public URL onto the upload root. References that do not
    /// carry the base URL prefix are treated as paths as-is (an absolute
    /// path replaces the root entirely when joined).
    fn resolve(&self, reference: &str) -> PathBuf {
        let relative = reference
            .strip_prefix(&format!("{}/", self.base_url))
            .unwrap_or(reference);
        self.upload_root.join(relative)
    }
}

impl ImageSource for FsImageSource {
    fn read(&self, reference: &str) -> Result<RgbaImage> {
        let path = self.resolve(reference);
        if !path.exists() {
            return Err(Error::ImageNotFound(reference.to_string()));
        }
        let image = image::open(&path)?;
        plog_debug!(
            "loaded image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(image.to_rgba8())
    }
}

/// Writes results as JPEG files under `vr/project_{id}/` in the upload root.
pub struct FsResultSink {
    upload_root: PathBuf,
    base_url: String,
}

impl FsResultSink {
    pub fn new(upload_root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            upload_root: upload_root.into(),
            base_url: base_url.to_string(),
        }
    }

    fn file_name(project: ProjectId, task: TaskId) -> String {
        format!("vr_{}_{}.jpg", project, task)
    }

    /// Filesystem path a result is written to.
    pub fn output_path(&self, project: ProjectId, task: TaskId) -> PathBuf {
        self.upload_root
            .join("vr")
            .join(format!("project_{}", project))
            .join(Self::file_name(project, task))
    }

    /// Public URL the written result is served under.
    pub fn output_url(&self, project: ProjectId, task: TaskId) -> String {
        format!(
            "{}/vr/project_{}/{}",
            self.base_url,
            project,
            Self::file_name(project, task)
        )
    }
}

impl ResultSink for FsResultSink {
    fn save(
        &self,
        image: &RgbaImage,
        project: ProjectId,
        task: TaskId,
        quality: u8,
    ) -> Result<String> {
        let path = self.output_path(project, task);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // JPEG has no alpha; quality reduction happens here, at encode time.
        let rgb = flatten_to_rgb(image);
        let file = fs::File::create(&path)?;
        let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality.clamp(1, 100));
        encoder.encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )?;

        plog_debug!("saved result {}", path.display());
        Ok(self.output_url(project, task))
    }
}

/// Write a small PNG to `path`, creating parent directories.
///
/// Shared by the CLI (sample inputs) and tests; kept here so the upload
/// layout helpers stay in one place.
pub fn write_png(path: &Path, image: &RgbaImage) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    image.save(path)?;
    Ok(())
}
