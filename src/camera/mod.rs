//! Render-camera parameters derived from an fSpy calibration.
//!
//! [`CameraSetup`] collects everything a host 3D application needs to
//! reproduce the calibrated view: the camera-to-world transform and horizontal
//! field of view (passed through untouched), the lens shift for an off-center
//! principal point, the reference image resolution and the scene unit scale.
//! No basis conversion is done here; hosts whose camera convention differs
//! from fSpy's (-Z forward, +Y up) convert the transform themselves.

pub mod pinhole;
pub mod shift;

pub use pinhole::{pinhole_intrinsics, Intrinsics, PinholeCamera};
pub use shift::{lens_shift, principal_point_relative, LensShift};

use crate::project::{CameraParameters, Project};
use crate::units::{ReferenceDistanceUnit, UnitScale};
use log::debug;
use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("Projection is outside the image")]
    ProjectionOutSideImage,
    #[error("Point is behind the camera")]
    PointBehindCamera,
    #[error("Focal length must be positive")]
    FocalLengthMustBePositive,
    #[error("Principal point must be finite")]
    PrincipalPointMustBeFinite,
    #[error("Camera transform is not invertible")]
    SingularTransform,
    #[error("Failed to write YAML: {0}")]
    YamlError(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CameraError {
    fn from(err: serde_yaml::Error) -> Self {
        CameraError::YamlError(err.to_string())
    }
}

/// A host camera that can take a calibrated view.
///
/// Implement this for the host application's camera object, then hand it to
/// [`CameraSetup::apply_to`].
pub trait RenderCamera {
    /// Set a perspective projection with this horizontal field of view, in radians.
    fn set_horizontal_fov(&mut self, fov: f64);

    /// Set the camera-to-world transform.
    fn set_world_transform(&mut self, transform: &Matrix4<f64>);

    /// Set the horizontal and vertical sensor shift.
    fn set_lens_shift(&mut self, shift: LensShift);

    /// Match the output resolution to the reference image. Hosts without a
    /// render resolution may ignore it.
    fn set_render_resolution(&mut self, _resolution: &Resolution) {}
}

/// Everything needed to set up a render camera from an fSpy project.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraSetup {
    pub transform: Matrix4<f64>,
    pub fov_horiz: f64,
    pub shift: LensShift,
    pub resolution: Resolution,
    pub reference_distance_unit: ReferenceDistanceUnit,
    pub unit_scale: UnitScale,
}

impl CameraSetup {
    pub fn from_project(project: &Project) -> Self {
        CameraSetup::from_parameters(
            project.camera_parameters(),
            project.reference_distance_unit(),
        )
    }

    pub fn from_parameters(params: &CameraParameters, unit: ReferenceDistanceUnit) -> Self {
        CameraSetup {
            transform: *params.camera_transform(),
            fov_horiz: params.fov_horiz(),
            shift: lens_shift(params),
            resolution: Resolution {
                width: params.image_width(),
                height: params.image_height(),
            },
            reference_distance_unit: unit,
            unit_scale: unit.scale(),
        }
    }

    /// Translation column of the transform.
    pub fn camera_location(&self) -> Vector3<f64> {
        self.transform.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Camera location multiplied by [`UnitScale::camera_distance_scale`].
    ///
    /// The transform itself is left alone; hosts that store location apart
    /// from rotation can use this value directly.
    pub fn scaled_camera_location(&self) -> Vector3<f64> {
        self.camera_location() * self.unit_scale.camera_distance_scale
    }

    /// Pushes field of view, transform, lens shift and resolution into `camera`.
    pub fn apply_to<C: RenderCamera + ?Sized>(&self, camera: &mut C) {
        debug!(
            "Applying camera setup: fov {:.6} rad, shift ({:.6}, {:.6}), {}x{}",
            self.fov_horiz,
            self.shift.x,
            self.shift.y,
            self.resolution.width,
            self.resolution.height
        );
        camera.set_horizontal_fov(self.fov_horiz);
        camera.set_world_transform(&self.transform);
        camera.set_lens_shift(self.shift);
        camera.set_render_resolution(&self.resolution);
    }

    /// Serializes the setup as a YAML document under a `camera` key.
    ///
    /// The transform is written row-major, matching the fSpy project layout.
    pub fn to_yaml_string(&self) -> Result<String, CameraError> {
        let rows: Vec<Vec<f64>> = self
            .transform
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();

        let camera = serde_yaml::Mapping::from_iter([
            (
                serde_yaml::Value::String("horizontal_fov".to_string()),
                serde_yaml::to_value(self.fov_horiz)?,
            ),
            (
                serde_yaml::Value::String("transform".to_string()),
                serde_yaml::to_value(rows)?,
            ),
            (
                serde_yaml::Value::String("shift".to_string()),
                serde_yaml::to_value(vec![self.shift.x, self.shift.y])?,
            ),
            (
                serde_yaml::Value::String("resolution".to_string()),
                serde_yaml::to_value(vec![self.resolution.width, self.resolution.height])?,
            ),
            (
                serde_yaml::Value::String("reference_distance_unit".to_string()),
                serde_yaml::to_value(self.reference_distance_unit)?,
            ),
            (
                serde_yaml::Value::String("unit_scale".to_string()),
                serde_yaml::to_value(self.unit_scale)?,
            ),
        ]);
        let yaml = serde_yaml::Mapping::from_iter([(
            serde_yaml::Value::String("camera".to_string()),
            serde_yaml::Value::Mapping(camera),
        )]);

        Ok(serde_yaml::to_string(&yaml)?)
    }

    /// Writes [`CameraSetup::to_yaml_string`] to `path`.
    pub fn save_to_yaml(&self, path: &str) -> Result<(), CameraError> {
        let yaml_string = self.to_yaml_string()?;
        let mut file = fs::File::create(path)?;
        file.write_all(yaml_string.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::test_support::{project_bytes, sample_state, PNG_SIGNATURE};
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct RecordingCamera {
        fov: Option<f64>,
        transform: Option<Matrix4<f64>>,
        shift: Option<LensShift>,
    }

    impl RenderCamera for RecordingCamera {
        fn set_horizontal_fov(&mut self, fov: f64) {
            self.fov = Some(fov);
        }

        fn set_world_transform(&mut self, transform: &Matrix4<f64>) {
            self.transform = Some(*transform);
        }

        fn set_lens_shift(&mut self, shift: LensShift) {
            self.shift = Some(shift);
        }
    }

    #[derive(Default)]
    struct RenderSettings {
        resolution: Option<Resolution>,
    }

    struct CameraWithRender {
        camera: RecordingCamera,
        render: RenderSettings,
    }

    impl RenderCamera for CameraWithRender {
        fn set_horizontal_fov(&mut self, fov: f64) {
            self.camera.set_horizontal_fov(fov);
        }

        fn set_world_transform(&mut self, transform: &Matrix4<f64>) {
            self.camera.set_world_transform(transform);
        }

        fn set_lens_shift(&mut self, shift: LensShift) {
            self.camera.set_lens_shift(shift);
        }

        fn set_render_resolution(&mut self, resolution: &Resolution) {
            self.render.resolution = Some(resolution.clone());
        }
    }

    fn sample_project(unit: &str) -> Project {
        let bytes = project_bytes(&sample_state(3000, 2000, (0.1, -0.05), unit), PNG_SIGNATURE);
        Project::parse(&bytes, "sample.fspy").unwrap()
    }

    #[test]
    fn test_from_project() {
        let project = sample_project("Meters");
        let setup = CameraSetup::from_project(&project);

        assert_eq!(&setup.transform, project.camera_parameters().camera_transform());
        assert_eq!(setup.fov_horiz, project.camera_parameters().fov_horiz());
        assert_relative_eq!(setup.shift.x, -0.05, epsilon = 1e-12);
        assert_relative_eq!(setup.shift.y, 0.025, epsilon = 1e-12);
        assert_eq!(
            setup.resolution,
            Resolution {
                width: 3000,
                height: 2000
            }
        );
        assert_eq!(setup.reference_distance_unit, ReferenceDistanceUnit::Meters);
        assert_eq!(setup.unit_scale, ReferenceDistanceUnit::Meters.scale());
    }

    #[test]
    fn test_scaled_camera_location() {
        let metric = CameraSetup::from_project(&sample_project("Centimeters"));
        assert_eq!(metric.camera_location(), Vector3::new(3.0, -10.0, 1.5));
        assert_eq!(metric.scaled_camera_location(), metric.camera_location());

        let imperial = CameraSetup::from_project(&sample_project("Inches"));
        assert_relative_eq!(
            imperial.scaled_camera_location(),
            Vector3::new(3.0, -10.0, 1.5) / 3.2808399,
            epsilon = 1e-12
        );
        // The transform itself keeps the unscaled translation.
        assert_eq!(imperial.transform[(0, 3)], 3.0);
    }

    #[test]
    fn test_apply_to_render_camera() {
        let setup = CameraSetup::from_project(&sample_project("Feet"));

        let mut camera = RecordingCamera::default();
        setup.apply_to(&mut camera);
        assert_eq!(camera.fov, Some(setup.fov_horiz));
        assert_eq!(camera.transform, Some(setup.transform));
        assert_eq!(camera.shift, Some(setup.shift));

        let mut with_render = CameraWithRender {
            camera: RecordingCamera::default(),
            render: RenderSettings::default(),
        };
        let dyn_camera: &mut dyn RenderCamera = &mut with_render;
        setup.apply_to(dyn_camera);
        assert_eq!(with_render.render.resolution, Some(setup.resolution.clone()));
        assert_eq!(with_render.camera.shift, Some(setup.shift));
    }

    #[test]
    fn test_save_to_yaml() {
        let setup = CameraSetup::from_project(&sample_project("Miles"));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("camera.yaml");
        setup.save_to_yaml(path.to_str().unwrap()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let yaml: serde_yaml::Value = serde_yaml::from_str(&contents).unwrap();
        let camera = &yaml["camera"];

        assert_eq!(camera["horizontal_fov"].as_f64(), Some(setup.fov_horiz));
        assert_eq!(camera["transform"][1][2].as_f64(), Some(-1.0));
        assert_eq!(camera["transform"][0][3].as_f64(), Some(3.0));
        assert_eq!(camera["resolution"][0].as_u64(), Some(3000));
        assert_eq!(camera["reference_distance_unit"].as_str(), Some("Miles"));
        assert_eq!(camera["unit_scale"]["scale_length"].as_f64(), Some(5280.0));
        assert_eq!(camera["unit_scale"]["is_imperial"].as_bool(), Some(true));
    }
}
