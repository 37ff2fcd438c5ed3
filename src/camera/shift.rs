//! Lens shift compensating for an off-center principal point.
//!
//! fSpy normalizes the principal point differently for portrait and landscape
//! images. The two branches below mirror those conventions exactly and are
//! evaluated in the same operation order, so the resulting framing matches
//! fSpy's own preview bit for bit. Do not merge them.

use crate::project::CameraParameters;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Horizontal and vertical sensor shift, as fractions of the larger sensor
/// dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LensShift {
    pub x: f64,
    pub y: f64,
}

/// Principal point relative to the image: (0, 0) top-left, (1, 1) bottom-right.
pub fn principal_point_relative(params: &CameraParameters) -> Vector2<f64> {
    let aspect = params.aspect_ratio();
    let pp = params.principal_point();
    if aspect <= 1.0 {
        portrait_relative(pp, aspect)
    } else {
        landscape_relative(pp, aspect)
    }
}

// In portrait images x spans [-aspect, aspect] and y spans [-1, 1].
fn portrait_relative(pp: Vector2<f64>, aspect: f64) -> Vector2<f64> {
    Vector2::new(0.5 * (pp.x / aspect + 1.0), 0.5 * (-pp.y + 1.0))
}

// In landscape images x spans [-1, 1] and y spans [-1/aspect, 1/aspect].
fn landscape_relative(pp: Vector2<f64>, aspect: f64) -> Vector2<f64> {
    Vector2::new(0.5 * (pp.x + 1.0), 0.5 * (-pp.y * aspect + 1.0))
}

/// Computes the lens shift that reproduces the calibrated principal point on
/// a camera whose optical axis defaults to the image center.
///
/// # Examples
///
/// ```rust
/// use fspy_tools::camera::lens_shift;
/// use fspy_tools::project::CameraParameters;
/// use nalgebra::{Matrix4, Vector2};
///
/// let params = CameraParameters::new(
///     Vector2::new(0.1, -0.05),
///     1.0,
///     Matrix4::identity(),
///     3000,
///     2000,
/// )
/// .unwrap();
/// let shift = lens_shift(&params);
/// assert!((shift.x + 0.05).abs() < 1e-12);
/// assert!((shift.y - 0.025).abs() < 1e-12);
/// ```
pub fn lens_shift(params: &CameraParameters) -> LensShift {
    let width = params.image_width() as f64;
    let height = params.image_height() as f64;

    let mut x_shift_scale = 1.0;
    let mut y_shift_scale = 1.0;
    if params.image_height() > params.image_width() {
        x_shift_scale = width / height;
    } else {
        y_shift_scale = height / width;
    }

    let pp_rel = principal_point_relative(params);
    LensShift {
        x: x_shift_scale * (0.5 - pp_rel.x),
        y: y_shift_scale * (-0.5 + pp_rel.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix4;

    fn params(width: u32, height: u32, pp: (f64, f64)) -> CameraParameters {
        CameraParameters::new(
            Vector2::new(pp.0, pp.1),
            1.0,
            Matrix4::identity(),
            width,
            height,
        )
        .unwrap()
    }

    #[test]
    fn test_landscape_worked_example() {
        let params = params(3000, 2000, (0.1, -0.05));

        let pp_rel = principal_point_relative(&params);
        assert_relative_eq!(pp_rel.x, 0.55, epsilon = 1e-12);
        assert_relative_eq!(pp_rel.y, 0.5375, epsilon = 1e-12);

        let shift = lens_shift(&params);
        assert_relative_eq!(shift.x, -0.05, epsilon = 1e-12);
        assert_relative_eq!(shift.y, 0.025, epsilon = 1e-12);
    }

    #[test]
    fn test_worked_example_operation_order() {
        let shift = lens_shift(&params(3000, 2000, (0.1, -0.05)));

        let y_shift_scale = 2000.0_f64 / 3000.0;
        let pp_rel_x = 0.5 * (0.1_f64 + 1.0);
        let pp_rel_y = 0.5 * (-(-0.05_f64) * 1.5 + 1.0);
        assert_eq!(shift.x, 1.0 * (0.5 - pp_rel_x));
        assert_eq!(shift.y, y_shift_scale * (-0.5 + pp_rel_y));
    }

    #[test]
    fn test_centered_square_has_no_shift() {
        let shift = lens_shift(&params(1024, 1024, (0.0, 0.0)));
        assert_eq!(shift.x, 0.0);
        assert_eq!(shift.y, 0.0);
    }

    #[test]
    fn test_branches_agree_at_unit_aspect() {
        for pp in [
            Vector2::new(0.0, 0.0),
            Vector2::new(0.3, -0.7),
            Vector2::new(-1.0, 1.0),
            Vector2::new(0.123456789, 0.987654321),
        ] {
            assert_eq!(portrait_relative(pp, 1.0), landscape_relative(pp, 1.0));
        }
    }

    #[test]
    fn test_portrait_scales_horizontal_shift() {
        let params = params(2000, 3000, (0.2, 0.1));
        let aspect = 2000.0 / 3000.0;

        let pp_rel = principal_point_relative(&params);
        assert_relative_eq!(pp_rel.x, 0.5 * (0.2 / aspect + 1.0), epsilon = 1e-12);
        assert_relative_eq!(pp_rel.y, 0.45, epsilon = 1e-12);

        let shift = lens_shift(&params);
        assert_relative_eq!(shift.x, aspect * (0.5 - pp_rel.x), epsilon = 1e-12);
        assert_relative_eq!(shift.x, -0.1, epsilon = 1e-12);
        assert_relative_eq!(shift.y, -0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_centered_principal_point_never_shifts() {
        for (width, height) in [(1920, 1080), (1080, 1920), (640, 640), (1, 5000)] {
            let shift = lens_shift(&params(width, height, (0.0, 0.0)));
            assert_eq!(shift.x, 0.0, "{width}x{height}");
            assert_eq!(shift.y, 0.0, "{width}x{height}");
        }
    }
}
