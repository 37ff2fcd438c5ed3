//! Reading fSpy project files.
//!
//! An `.fspy` file is a small little-endian container:
//!
//! | offset | field | size |
//! |---|---|---|
//! | 0 | magic word `fspy` | 4 |
//! | 4 | file version, must be `1` | 4 |
//! | 8 | metadata length | 4 |
//! | 12 | image length | 4 |
//! | 16 | JSON state document | metadata length |
//! | 16 + metadata length | reference image | image length |
//!
//! [`Project::parse`] decodes such a buffer into an immutable [`Project`].
//! Parsing is all-or-nothing: any failure returns a [`ProjectError`] and no
//! partial project is ever built.

pub mod header;
mod metadata;
pub mod options;

pub use header::{ContainerHeader, FILE_VERSION, HEADER_SIZE, MAGIC_WORD};
pub use options::ParseOptions;

use crate::units::ReferenceDistanceUnit;
use header::ContainerReader;
use log::info;
use nalgebra::{Matrix4, Vector2};
use std::fs;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Invalid fSpy project: {0}")]
    InvalidFormat(String),
    #[error("Unsupported fSpy project file version {0}")]
    UnsupportedVersion(u32),
    #[error("fSpy project has no image data")]
    MissingImageData,
    #[error("fSpy project has no camera parameters")]
    MissingCameraParameters,
    #[error("Truncated {section} section: expected {expected} bytes, found {available}")]
    TruncatedData {
        section: &'static str,
        expected: usize,
        available: usize,
    },
    #[error("Invalid camera parameters: {0}")]
    InvalidCameraParameters(String),
    #[error("IO Error: {0}")]
    IOError(String),
    #[error("Failed to load YAML: {0}")]
    YamlError(String),
}

impl From<std::io::Error> for ProjectError {
    fn from(err: std::io::Error) -> Self {
        ProjectError::IOError(err.to_string())
    }
}

impl From<yaml_rust::ScanError> for ProjectError {
    fn from(err: yaml_rust::ScanError) -> Self {
        ProjectError::YamlError(err.to_string())
    }
}

/// Calibrated camera as solved by fSpy.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraParameters {
    principal_point: Vector2<f64>,
    fov_horiz: f64,
    camera_transform: Matrix4<f64>,
    image_width: u32,
    image_height: u32,
}

impl CameraParameters {
    /// Builds camera parameters, rejecting a zero image dimension.
    ///
    /// No other value is checked; see [`ParseOptions`] for opt-in validation.
    ///
    /// # Errors
    ///
    /// [`ProjectError::InvalidFormat`] if `image_width` or `image_height` is zero.
    pub fn new(
        principal_point: Vector2<f64>,
        fov_horiz: f64,
        camera_transform: Matrix4<f64>,
        image_width: u32,
        image_height: u32,
    ) -> Result<Self, ProjectError> {
        if image_width == 0 || image_height == 0 {
            return Err(ProjectError::InvalidFormat(format!(
                "Image dimensions must be positive, found {image_width}x{image_height}"
            )));
        }

        Ok(CameraParameters {
            principal_point,
            fov_horiz,
            camera_transform,
            image_width,
            image_height,
        })
    }

    /// Principal point in fSpy's normalized image plane: origin at the image
    /// center, the longer image side spanning [-1, 1], y pointing up.
    pub fn principal_point(&self) -> Vector2<f64> {
        self.principal_point
    }

    /// Horizontal field of view in radians.
    pub fn fov_horiz(&self) -> f64 {
        self.fov_horiz
    }

    /// Camera-to-world transform.
    pub fn camera_transform(&self) -> &Matrix4<f64> {
        &self.camera_transform
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    /// `image_width / image_height`.
    pub fn aspect_ratio(&self) -> f64 {
        self.image_width as f64 / self.image_height as f64
    }
}

/// A parsed fSpy project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    file_name: String,
    camera_parameters: CameraParameters,
    reference_distance_unit: ReferenceDistanceUnit,
    image_data: Vec<u8>,
}

impl Project {
    /// Parses a project from an in-memory buffer.
    ///
    /// `file_name` is stored as the project's display name and is not
    /// interpreted.
    ///
    /// # Errors
    ///
    /// Checks run in file order and stop at the first failure:
    /// * [`ProjectError::InvalidFormat`]: wrong magic word.
    /// * [`ProjectError::UnsupportedVersion`]: version other than [`FILE_VERSION`].
    /// * [`ProjectError::MissingImageData`]: declared image length is zero.
    /// * [`ProjectError::TruncatedData`]: a section is shorter than declared.
    /// * [`ProjectError::InvalidFormat`]: malformed JSON, a transform that is not
    ///   4x4, a zero image dimension, or an unknown reference distance unit.
    /// * [`ProjectError::MissingCameraParameters`]: `cameraParameters` absent or null.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fspy_tools::project::{Project, ProjectError};
    ///
    /// let result = Project::parse(b"PK\x03\x04 not a project", "archive.zip");
    /// assert!(matches!(result, Err(ProjectError::InvalidFormat(_))));
    /// ```
    pub fn parse(bytes: &[u8], file_name: impl Into<String>) -> Result<Self, ProjectError> {
        Project::parse_with_options(bytes, file_name, &ParseOptions::default())
    }

    /// Like [`Project::parse`], then runs the checks enabled in `options`.
    pub fn parse_with_options(
        bytes: &[u8],
        file_name: impl Into<String>,
        options: &ParseOptions,
    ) -> Result<Self, ProjectError> {
        let mut reader = ContainerReader::new(bytes);
        let header = reader.read_header()?;

        let metadata_bytes = reader.read_section("metadata", header.metadata_len)?;
        let document = metadata::decode(metadata_bytes)?;
        let image_data = reader.read_section("image", header.image_len)?;

        let metadata = metadata::extract(&document)?;
        options.validate(&metadata.camera_parameters)?;

        Ok(Project {
            file_name: file_name.into(),
            camera_parameters: metadata.camera_parameters,
            reference_distance_unit: metadata.reference_distance_unit,
            image_data: image_data.to_vec(),
        })
    }

    /// Reads and parses the project at `path`.
    ///
    /// The display name is the final component of `path`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProjectError> {
        Project::load_from_file_with_options(path, &ParseOptions::default())
    }

    pub fn load_from_file_with_options<P: AsRef<Path>>(
        path: P,
        options: &ParseOptions,
    ) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let bytes = fs::read(path)?;
        let project = Project::parse_with_options(&bytes, file_name, options)?;
        info!(
            "Loaded fSpy project '{}' ({}x{}, {} image bytes)",
            project.file_name,
            project.camera_parameters.image_width,
            project.camera_parameters.image_height,
            project.image_data.len()
        );

        Ok(project)
    }

    /// Display name, typically the project's file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn camera_parameters(&self) -> &CameraParameters {
        &self.camera_parameters
    }

    pub fn reference_distance_unit(&self) -> ReferenceDistanceUnit {
        self.reference_distance_unit
    }

    /// The embedded reference image, exactly as stored. Never empty.
    pub fn image_data(&self) -> &[u8] {
        &self.image_data
    }

    /// Consumes the project, returning the image payload.
    pub fn into_image_data(self) -> Vec<u8> {
        self.image_data
    }

    /// Guesses the encoding of the image payload from its leading bytes.
    ///
    /// The image is not decoded; `None` means the signature is unknown.
    pub fn image_format(&self) -> Option<image::ImageFormat> {
        image::guess_format(&self.image_data).ok()
    }
}

/// Parses `bytes` with default options. Shorthand for [`Project::parse`].
pub fn parse(bytes: &[u8], file_name: impl Into<String>) -> Result<Project, ProjectError> {
    Project::parse(bytes, file_name)
}
