//! Init command implementation.
//!
//! Generates a `swatchcam.yaml` manifest spelling out every default.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::discovery::{scan_directory, Manifest, MANIFEST_FILENAME};
use crate::error::{Result, SwatchError};
use crate::output::{display_path, plural, Printer};

/// Initialize a swatchcam project (generates swatchcam.yaml)
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing swatchcam.yaml
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args.path.join(MANIFEST_FILENAME);

    // Check for existing manifest
    if manifest_path.exists() && !args.force {
        return Err(SwatchError::Config {
            message: format!("{} already exists", MANIFEST_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    let defaults = Manifest::default();
    let yaml = default_manifest(&defaults);

    fs::write(&manifest_path, &yaml).map_err(|e| SwatchError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write manifest: {}", e),
    })?;

    let photos = scan_directory(&args.path, &defaults).len();
    printer.success(
        "Created",
        &format!(
            "{} ({} found)",
            display_path(&manifest_path),
            plural(photos, "photo", "photos")
        ),
    );

    Ok(())
}

/// Build YAML manually so each setting carries a comment.
fn default_manifest(m: &Manifest) -> String {
    let mut yaml = String::new();

    yaml.push_str("# per-point: crop and decode five sample points\n");
    yaml.push_str("# whole-image: dominant colours of the whole photo\n");
    yaml.push_str("strategy: per-point\n\n");

    yaml.push_str("# Cropped region side, in pixels\n");
    yaml.push_str(&format!("region_size: {}\n", m.region_size));
    yaml.push_str("# png, jpeg or bmp\n");
    yaml.push_str("region_format: png\n\n");

    yaml.push_str("# container: decode the region image\n");
    yaml.push_str("# fixed-offset: read RGB at pixel_offset bytes into the region\n");
    yaml.push_str("decoder: container\n");
    yaml.push_str(&format!("pixel_offset: {}\n\n", m.pixel_offset));

    yaml.push_str("# persist keeps cropped regions with saved palettes, ephemeral drops them\n");
    yaml.push_str("region_policy: persist\n");
    yaml.push_str(&format!("data_dir: {}\n", m.data_dir.display()));
    yaml.push_str(&format!("timeout_ms: {}\n\n", m.timeout_ms));

    yaml.push_str("# Whole-image colour used when nothing better is found\n");
    yaml.push_str(&format!("fallback: \"{}\"\n", m.fallback));
    yaml.push_str(&format!("cache: {}\n\n", m.cache));

    yaml.push_str("excludes: []\n");
    yaml
}
