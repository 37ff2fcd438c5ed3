//! Extraction of camera parameters and calibration settings from the JSON
//! state document fSpy stores in the project container.

use super::{CameraParameters, ProjectError};
use crate::units::ReferenceDistanceUnit;
use nalgebra::{Matrix4, Vector2};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCameraParameters {
    principal_point: RawPoint,
    horizontal_field_of_view: f64,
    camera_transform: RawTransform,
    image_width: u32,
    image_height: u32,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct RawTransform {
    rows: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCalibrationSettingsBase {
    reference_distance_unit: String,
}

/// Fields the core needs from the state document.
#[derive(Debug)]
pub(crate) struct Metadata {
    pub(crate) camera_parameters: CameraParameters,
    pub(crate) reference_distance_unit: ReferenceDistanceUnit,
}

/// Parses the metadata section as a JSON object.
pub(crate) fn decode(bytes: &[u8]) -> Result<Value, ProjectError> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| ProjectError::InvalidFormat(format!("Malformed project metadata: {e}")))?;

    if !document.is_object() {
        return Err(ProjectError::InvalidFormat(
            "Project metadata is not a JSON object".to_string(),
        ));
    }

    Ok(document)
}

/// Pulls camera parameters and the reference distance unit out of a decoded
/// state document.
pub(crate) fn extract(document: &Value) -> Result<Metadata, ProjectError> {
    let camera_json = match document.get("cameraParameters") {
        None | Some(Value::Null) => return Err(ProjectError::MissingCameraParameters),
        Some(value) => value,
    };
    let raw_camera = RawCameraParameters::deserialize(camera_json)
        .map_err(|e| ProjectError::InvalidFormat(format!("Invalid cameraParameters: {e}")))?;

    let settings_json = document.get("calibrationSettingsBase").ok_or_else(|| {
        ProjectError::InvalidFormat("Project metadata missing calibrationSettingsBase".to_string())
    })?;
    let raw_settings = RawCalibrationSettingsBase::deserialize(settings_json).map_err(|e| {
        ProjectError::InvalidFormat(format!("Invalid calibrationSettingsBase: {e}"))
    })?;

    let camera_transform = transform_from_rows(&raw_camera.camera_transform.rows)?;
    let camera_parameters = CameraParameters::new(
        Vector2::new(raw_camera.principal_point.x, raw_camera.principal_point.y),
        raw_camera.horizontal_field_of_view,
        camera_transform,
        raw_camera.image_width,
        raw_camera.image_height,
    )?;
    let reference_distance_unit = raw_settings.reference_distance_unit.parse()?;

    Ok(Metadata {
        camera_parameters,
        reference_distance_unit,
    })
}

/// Builds a matrix from a row-major 4x4 grid, rejecting any other shape.
fn transform_from_rows(rows: &[Vec<f64>]) -> Result<Matrix4<f64>, ProjectError> {
    if rows.len() != 4 || rows.iter().any(|row| row.len() != 4) {
        let shape: Vec<usize> = rows.iter().map(Vec::len).collect();
        return Err(ProjectError::InvalidFormat(format!(
            "cameraTransform.rows must be a 4x4 grid, found row lengths {shape:?}"
        )));
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(Matrix4::from_row_slice(&flat))
}
