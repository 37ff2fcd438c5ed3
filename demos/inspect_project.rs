//! fSpy Project Inspector
//!
//! This example parses an fSpy project file, prints the derived render camera
//! parameters and optionally writes the embedded reference image and a YAML
//! export of the camera setup.
//!
//! Usage:
//! ```bash
//! cargo run --example inspect_project -- \
//!   --input-path path/to/project.fspy \
//!   --image-out output/reference \
//!   --yaml-out output/camera.yaml
//! ```

use clap::Parser;
use fspy_tools::camera::pinhole_intrinsics;
use fspy_tools::{CameraSetup, ParseOptions, Project};
use flexi_logger::{colored_detailed_format, detailed_format, Duplicate, FileSpec, Logger};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// fSpy project inspection tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the .fspy project file
    #[arg(short = 'p', long)]
    input_path: PathBuf,

    /// YAML file with a `parse_options` section (see samples/strict_options.yaml)
    #[arg(short = 'o', long)]
    options: Option<PathBuf>,

    /// Enable every validation check, ignoring --options
    #[arg(long)]
    strict: bool,

    /// Write the embedded image here; the extension is added from the sniffed format
    #[arg(long)]
    image_out: Option<PathBuf>,

    /// Write the derived camera setup as YAML
    #[arg(long)]
    yaml_out: Option<PathBuf>,
}

fn load_options(cli: &Cli) -> Result<ParseOptions, Box<dyn std::error::Error>> {
    if cli.strict {
        return Ok(ParseOptions::strict());
    }
    match &cli.options {
        Some(path) => {
            let path_str = path.to_str().ok_or("Invalid options path string")?;
            info!("Loading parse options from: {}", path_str);
            Ok(ParseOptions::load_from_yaml(path_str)?)
        }
        None => Ok(ParseOptions::default()),
    }
}

fn write_image(project: &Project, base: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut path = base.to_path_buf();
    match project.image_format() {
        Some(format) => {
            if let Some(extension) = format.extensions_str().first() {
                path.set_extension(extension);
            }
        }
        None => warn!("Unrecognized image signature, writing raw bytes"),
    }
    fs::write(&path, project.image_data())?;
    info!("Wrote {} image bytes to {:?}", project.image_data().len(), path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Logger::try_with_str("info")?
        .log_to_file(
            FileSpec::default()
                .directory("logs")
                .suppress_timestamp()
                .suffix("log"),
        )
        .duplicate_to_stdout(Duplicate::All)
        .format_for_files(detailed_format)
        .format_for_stdout(colored_detailed_format)
        .set_palette("196;208;76;39;178".to_string())
        .start()?;

    let cli = Cli::parse();
    info!("Input Path: {:?}", cli.input_path);

    let options = load_options(&cli)?;
    let project = match Project::load_from_file_with_options(&cli.input_path, &options) {
        Ok(project) => project,
        Err(e) => {
            error!("Can not load fSpy project file: {}", e);
            return Err(e.into());
        }
    };

    let params = project.camera_parameters();
    let setup = CameraSetup::from_project(&project);

    println!("\n=== {} ===", project.file_name());
    println!(
        "  Image: {}x{} ({:?}, {} bytes)",
        setup.resolution.width,
        setup.resolution.height,
        project.image_format(),
        project.image_data().len()
    );
    println!(
        "  Horizontal FOV: {:.6} rad ({:.3} deg)",
        setup.fov_horiz,
        setup.fov_horiz.to_degrees()
    );
    println!("  Principal point: {:?}", params.principal_point());
    println!("  Lens shift: x {:.6}, y {:.6}", setup.shift.x, setup.shift.y);
    println!("  Camera transform:{}", setup.transform);
    println!(
        "  Reference unit: {} (scale_length {}, imperial {}, camera distance x{:.6})",
        setup.reference_distance_unit,
        setup.unit_scale.scale_length,
        setup.unit_scale.is_imperial,
        setup.unit_scale.camera_distance_scale
    );
    println!("  Scaled camera location: {:?}", setup.scaled_camera_location());
    println!("  Pinhole intrinsics: {:?}", pinhole_intrinsics(params));

    if let Some(base) = &cli.image_out {
        write_image(&project, base)?;
    }

    if let Some(path) = &cli.yaml_out {
        let path_str = path.to_str().ok_or("Invalid YAML output path string")?;
        setup.save_to_yaml(path_str)?;
        info!("Saved camera setup to {}", path_str);
    }

    Ok(())
}
