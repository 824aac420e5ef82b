//! Manifest lookup and photo discovery.
//!
//! A `swatchcam.yaml` manifest in the working directory configures the
//! pipeline; without one, defaults apply. Photos are found by walking the
//! paths given on the command line.

mod manifest;
mod scanner;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use manifest::Manifest;
pub use scanner::{is_photo, scan_directory, scan_paths, PHOTO_EXTENSIONS};

/// The name of the manifest file.
pub const MANIFEST_FILENAME: &str = "swatchcam.yaml";

/// Load the manifest.
///
/// An explicit path must exist. Otherwise `swatchcam.yaml` in `root` is
/// used when present, and defaults when not. Returns the manifest and the
/// file it came from, if any.
pub fn load_manifest(explicit: Option<&Path>, root: &Path) -> Result<(Manifest, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((Manifest::load(path)?, Some(path.to_path_buf())));
    }

    let path = root.join(MANIFEST_FILENAME);
    if path.exists() {
        Ok((Manifest::load(&path)?, Some(path)))
    } else {
        Ok((Manifest::default(), None))
    }
}
