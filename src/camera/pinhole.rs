//! Pinhole view of an fSpy calibration.
//!
//! Hosts whose camera model takes an intrinsic matrix rather than a field of
//! view plus lens shift can use [`PinholeCamera`]. It follows the fSpy camera
//! convention: the camera looks down its local -Z axis with +Y up, and pixel
//! rows run top-down.

use super::{principal_point_relative, CameraError, Resolution};
use crate::project::CameraParameters;
use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Intrinsics {
    /// The 3x3 calibration matrix `K`.
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }
}

/// Pixel-space intrinsics implied by the calibration.
///
/// `fx = fy = (width / 2) / tan(fov_horiz / 2)` and the principal point is
/// the relative principal point scaled to pixels.
pub fn pinhole_intrinsics(params: &CameraParameters) -> Intrinsics {
    let width = params.image_width() as f64;
    let height = params.image_height() as f64;
    let focal = 0.5 * width / (0.5 * params.fov_horiz()).tan();
    let pp_rel = principal_point_relative(params);

    Intrinsics {
        fx: focal,
        fy: focal,
        cx: pp_rel.x * width,
        cy: pp_rel.y * height,
    }
}

/// Common validation functions for pinhole parameters.
pub mod validation {
    use super::*;

    pub fn validate_intrinsics(intrinsics: &Intrinsics) -> Result<(), CameraError> {
        if !(intrinsics.fx > 0.0 && intrinsics.fy > 0.0) || !intrinsics.fx.is_finite() {
            return Err(CameraError::FocalLengthMustBePositive);
        }
        if !intrinsics.cx.is_finite() || !intrinsics.cy.is_finite() {
            return Err(CameraError::PrincipalPointMustBeFinite);
        }
        Ok(())
    }
}

/// A calibrated pinhole camera placed in the world.
#[derive(Debug, Clone)]
pub struct PinholeCamera {
    pub intrinsics: Intrinsics,
    pub resolution: Resolution,
    camera_to_world: Matrix4<f64>,
    world_to_camera: Matrix4<f64>,
}

impl PinholeCamera {
    /// Builds a camera from parsed fSpy parameters.
    ///
    /// # Errors
    ///
    /// * [`CameraError::FocalLengthMustBePositive`] if the field of view does
    ///   not yield a positive, finite focal length.
    /// * [`CameraError::PrincipalPointMustBeFinite`] for a NaN or infinite
    ///   principal point.
    /// * [`CameraError::SingularTransform`] if the camera transform cannot be
    ///   inverted.
    pub fn from_parameters(params: &CameraParameters) -> Result<Self, CameraError> {
        let intrinsics = pinhole_intrinsics(params);
        validation::validate_intrinsics(&intrinsics)?;

        let camera_to_world = *params.camera_transform();
        let world_to_camera = camera_to_world
            .try_inverse()
            .ok_or(CameraError::SingularTransform)?;

        Ok(PinholeCamera {
            intrinsics,
            resolution: Resolution {
                width: params.image_width(),
                height: params.image_height(),
            },
            camera_to_world,
            world_to_camera,
        })
    }

    /// Projects a world-space point to pixel coordinates.
    ///
    /// # Errors
    ///
    /// * [`CameraError::PointBehindCamera`] if the point is not in front of
    ///   the camera.
    /// * [`CameraError::ProjectionOutSideImage`] if it lands outside the image.
    pub fn project(&self, point_world: &Vector3<f64>) -> Result<Vector2<f64>, CameraError> {
        let p = self.world_to_camera * Vector4::new(point_world.x, point_world.y, point_world.z, 1.0);
        let depth = -p.z;
        if depth < f64::EPSILON.sqrt() {
            return Err(CameraError::PointBehindCamera);
        }

        let u = self.intrinsics.cx + self.intrinsics.fx * p.x / depth;
        let v = self.intrinsics.cy - self.intrinsics.fy * p.y / depth;

        if u < 0.0
            || u >= self.resolution.width as f64
            || v < 0.0
            || v >= self.resolution.height as f64
        {
            return Err(CameraError::ProjectionOutSideImage);
        }

        Ok(Vector2::new(u, v))
    }

    /// Camera center in world coordinates.
    pub fn center(&self) -> Vector3<f64> {
        self.camera_to_world.fixed_view::<3, 1>(0, 3).into_owned()
    }
}
