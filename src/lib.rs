//! fSpy Tools Library
//!
//! A Rust library for reading fSpy project files and turning their camera
//! calibration into parameters a render camera can use:
//! - Parsing the `.fspy` binary container (magic word, version, JSON state
//!   document and embedded reference image)
//! - Horizontal field of view and camera-to-world transform passthrough
//! - Lens shift compensating for an off-center principal point
//! - Scene scale for the reference distance unit
//! - Pinhole intrinsics for hosts that prefer a calibration matrix
//!
//! ```rust,no_run
//! use fspy_tools::{CameraSetup, Project};
//!
//! let project = Project::load_from_file("canon5d_16mm.fspy")?;
//! let setup = CameraSetup::from_project(&project);
//! println!("fov {} shift {:?}", setup.fov_horiz, setup.shift);
//! # Ok::<(), fspy_tools::ProjectError>(())
//! ```

pub mod camera;
pub mod project;
pub mod units;

// Re-export commonly used types
pub use camera::{
    lens_shift, CameraError, CameraSetup, Intrinsics, LensShift, PinholeCamera, RenderCamera,
    Resolution,
};

pub use project::{parse, CameraParameters, ParseOptions, Project, ProjectError};

pub use units::{ReferenceDistanceUnit, UnitScale};
