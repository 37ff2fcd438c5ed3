//! Reference distance units and the scene scale they imply.
//!
//! fSpy lets the user type a known real-world distance in one of seven units.
//! [`ReferenceDistanceUnit`] is that closed set, and [`UnitScale`] is the scale a
//! host scene should adopt so the calibrated camera lands at the right size.

use crate::project::ProjectError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Feet per meter. Imperial scenes scale camera distances by its reciprocal.
pub const FEET_PER_METER: f64 = 3.2808399;

/// The unit the reference distance was entered in.
///
/// There is deliberately no default variant: a project either names one of
/// these seven labels or fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceDistanceUnit {
    Millimeters,
    Centimeters,
    Meters,
    Kilometers,
    Inches,
    Feet,
    Miles,
}

/// Scene scale derived from a [`ReferenceDistanceUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitScale {
    /// Length of one scene unit expressed in the unit system's base unit
    /// (meters for metric, feet for imperial).
    pub scale_length: f64,
    /// `true` for inches, feet and miles.
    pub is_imperial: bool,
    /// Multiplier a host may apply to the camera translation. `1.0` for metric.
    pub camera_distance_scale: f64,
}

impl ReferenceDistanceUnit {
    /// All recognized units, in the order fSpy lists them.
    pub const ALL: [ReferenceDistanceUnit; 7] = [
        ReferenceDistanceUnit::Millimeters,
        ReferenceDistanceUnit::Centimeters,
        ReferenceDistanceUnit::Meters,
        ReferenceDistanceUnit::Kilometers,
        ReferenceDistanceUnit::Inches,
        ReferenceDistanceUnit::Feet,
        ReferenceDistanceUnit::Miles,
    ];

    /// The label fSpy writes into `calibrationSettingsBase.referenceDistanceUnit`.
    pub fn label(&self) -> &'static str {
        match self {
            ReferenceDistanceUnit::Millimeters => "Millimeters",
            ReferenceDistanceUnit::Centimeters => "Centimeters",
            ReferenceDistanceUnit::Meters => "Meters",
            ReferenceDistanceUnit::Kilometers => "Kilometers",
            ReferenceDistanceUnit::Inches => "Inches",
            ReferenceDistanceUnit::Feet => "Feet",
            ReferenceDistanceUnit::Miles => "Miles",
        }
    }

    pub fn is_imperial(&self) -> bool {
        matches!(
            self,
            ReferenceDistanceUnit::Inches
                | ReferenceDistanceUnit::Feet
                | ReferenceDistanceUnit::Miles
        )
    }

    /// Looks up the scene scale for this unit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fspy_tools::units::ReferenceDistanceUnit;
    ///
    /// let scale = ReferenceDistanceUnit::Centimeters.scale();
    /// assert_eq!(scale.scale_length, 0.01);
    /// assert!(!scale.is_imperial);
    /// assert_eq!(scale.camera_distance_scale, 1.0);
    /// ```
    pub fn scale(&self) -> UnitScale {
        let scale_length = match self {
            ReferenceDistanceUnit::Millimeters => 0.001,
            ReferenceDistanceUnit::Centimeters => 0.01,
            ReferenceDistanceUnit::Meters => 1.0,
            ReferenceDistanceUnit::Kilometers => 1000.0,
            ReferenceDistanceUnit::Inches => 1.0 / 12.0,
            ReferenceDistanceUnit::Feet => 1.0,
            ReferenceDistanceUnit::Miles => 5280.0,
        };
        let is_imperial = self.is_imperial();
        let camera_distance_scale = if is_imperial {
            1.0 / FEET_PER_METER
        } else {
            1.0
        };

        UnitScale {
            scale_length,
            is_imperial,
            camera_distance_scale,
        }
    }
}

impl fmt::Display for ReferenceDistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReferenceDistanceUnit {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReferenceDistanceUnit::ALL
            .into_iter()
            .find(|unit| unit.label() == s)
            .ok_or_else(|| {
                ProjectError::InvalidFormat(format!("Unrecognized reference distance unit '{s}'"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_table() {
        let expected = [
            ("Millimeters", 0.001, false),
            ("Centimeters", 0.01, false),
            ("Meters", 1.0, false),
            ("Kilometers", 1000.0, false),
            ("Inches", 1.0 / 12.0, true),
            ("Feet", 1.0, true),
            ("Miles", 5280.0, true),
        ];

        for (label, scale_length, is_imperial) in expected {
            let unit: ReferenceDistanceUnit = label.parse().unwrap();
            assert_eq!(unit.label(), label);
            let scale = unit.scale();
            assert_eq!(scale.scale_length, scale_length, "scale for {label}");
            assert_eq!(scale.is_imperial, is_imperial, "imperial flag for {label}");
        }
    }

    #[test]
    fn test_every_variant_has_distinct_label() {
        let mut labels: Vec<_> = ReferenceDistanceUnit::ALL.iter().map(|u| u.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), ReferenceDistanceUnit::ALL.len());
    }

    #[test]
    fn test_unknown_unit_is_invalid_format() {
        for label in ["No unit", "meters", "Yards", ""] {
            let result = label.parse::<ReferenceDistanceUnit>();
            assert!(
                matches!(result, Err(ProjectError::InvalidFormat(_))),
                "'{label}' should be rejected"
            );
        }
    }

    #[test]
    fn test_inches_camera_distance_scale() {
        let scale = ReferenceDistanceUnit::Inches.scale();
        assert_eq!(scale.scale_length, 1.0 / 12.0);
        assert!(scale.is_imperial);
        assert_eq!(scale.camera_distance_scale, 1.0 / 3.2808399);
        assert_relative_eq!(scale.camera_distance_scale, 0.3048, epsilon = 1e-7);
    }

    #[test]
    fn test_metric_units_keep_camera_distance() {
        for unit in ReferenceDistanceUnit::ALL.iter().filter(|u| !u.is_imperial()) {
            assert_eq!(unit.scale().camera_distance_scale, 1.0);
        }
    }
}
