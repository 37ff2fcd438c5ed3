//! Opt-in semantic checks on parsed camera parameters.
//!
//! fSpy itself never validates the numbers it writes, so the default
//! [`ParseOptions`] accepts any structurally well-formed project. Hosts that
//! want to reject degenerate calibrations turn the checks on explicitly, in
//! code or from a YAML file:
//!
//! ```yaml
//! parse_options:
//!   validate_rotation: true
//!   validate_field_of_view: true
//!   validate_principal_point: true
//!   orthonormality_tolerance: 1.0e-6
//! ```

use super::{CameraParameters, ProjectError};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs;
use yaml_rust::{Yaml, YamlLoader};

/// Semantic checks applied after a project has been structurally decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Require the upper-left 3x3 block of the camera transform to be a proper rotation.
    pub validate_rotation: bool,
    /// Require the horizontal field of view to lie strictly inside (0, π).
    pub validate_field_of_view: bool,
    /// Require both principal point coordinates to be finite.
    pub validate_principal_point: bool,
    /// Largest absolute deviation allowed in `RᵀR - I` and `det(R) - 1`.
    pub orthonormality_tolerance: f64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            validate_rotation: false,
            validate_field_of_view: false,
            validate_principal_point: false,
            orthonormality_tolerance: 1e-6,
        }
    }
}

impl ParseOptions {
    /// Enables every check.
    pub fn strict() -> Self {
        ParseOptions {
            validate_rotation: true,
            validate_field_of_view: true,
            validate_principal_point: true,
            ..ParseOptions::default()
        }
    }

    /// Loads options from the `parse_options` mapping of a YAML file.
    ///
    /// Keys that are absent keep their default value.
    ///
    /// # Errors
    ///
    /// * [`ProjectError::IOError`] if the file cannot be read.
    /// * [`ProjectError::YamlError`] if the YAML is malformed, the
    ///   `parse_options` mapping is missing, or a value has the wrong type.
    pub fn load_from_yaml(path: &str) -> Result<Self, ProjectError> {
        let contents = fs::read_to_string(path)?;
        let docs = YamlLoader::load_from_str(&contents)?;
        let doc = docs
            .first()
            .ok_or_else(|| ProjectError::YamlError("YAML file is empty".to_string()))?;

        let section = &doc["parse_options"];
        if section.is_badvalue() {
            return Err(ProjectError::YamlError(
                "YAML missing 'parse_options'".to_string(),
            ));
        }

        let defaults = ParseOptions::default();
        Ok(ParseOptions {
            validate_rotation: yaml_bool(section, "validate_rotation", defaults.validate_rotation)?,
            validate_field_of_view: yaml_bool(
                section,
                "validate_field_of_view",
                defaults.validate_field_of_view,
            )?,
            validate_principal_point: yaml_bool(
                section,
                "validate_principal_point",
                defaults.validate_principal_point,
            )?,
            orthonormality_tolerance: match &section["orthonormality_tolerance"] {
                Yaml::BadValue => defaults.orthonormality_tolerance,
                Yaml::Integer(value) => *value as f64,
                value => value.as_f64().ok_or_else(|| {
                    ProjectError::YamlError(
                        "Invalid orthonormality_tolerance: not a float".to_string(),
                    )
                })?,
            },
        })
    }

    /// Runs the enabled checks against `params`.
    pub fn validate(&self, params: &CameraParameters) -> Result<(), ProjectError> {
        if self.validate_principal_point {
            let pp = params.principal_point();
            if !pp.x.is_finite() || !pp.y.is_finite() {
                return Err(ProjectError::InvalidCameraParameters(
                    "principal point must be finite".to_string(),
                ));
            }
        }

        if self.validate_field_of_view {
            let fov = params.fov_horiz();
            if !(fov > 0.0 && fov < PI) {
                return Err(ProjectError::InvalidCameraParameters(format!(
                    "horizontal field of view {fov} is outside (0, pi)"
                )));
            }
        }

        if self.validate_rotation {
            let rotation: Matrix3<f64> = params
                .camera_transform()
                .fixed_view::<3, 3>(0, 0)
                .into_owned();
            let deviation = (rotation.transpose() * rotation - Matrix3::identity()).amax();
            let det_error = (rotation.determinant() - 1.0).abs();

            // NaN entries fail both comparisons.
            if !(deviation <= self.orthonormality_tolerance)
                || !(det_error <= self.orthonormality_tolerance)
            {
                return Err(ProjectError::InvalidCameraParameters(format!(
                    "camera rotation is not orthonormal (|RᵀR - I| = {deviation:e}, |det - 1| = {det_error:e})"
                )));
            }
        }

        Ok(())
    }
}

fn yaml_bool(section: &Yaml, key: &str, default: bool) -> Result<bool, ProjectError> {
    match &section[key] {
        Yaml::BadValue => Ok(default),
        value => value
            .as_bool()
            .ok_or_else(|| ProjectError::YamlError(format!("Invalid {key}: not a boolean"))),
    }
}
