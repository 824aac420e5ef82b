//! File system scanner for discovering photos to sample.
//!
//! Recursively walks directories and keeps files whose extension the
//! `image` crate can decode.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, SwatchError};

use super::manifest::Manifest;

/// Photo extensions picked up when scanning directories.
pub const PHOTO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tif", "tiff"];

/// Check whether a path looks like a photo by its extension.
pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PHOTO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan a directory for photos, in file-name order.
pub fn scan_directory(root: &Path, manifest: &Manifest) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }

    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| is_photo(path) && !manifest.is_excluded(path))
        .collect()
}

/// Expand a list of files and directories into photo paths.
///
/// Files named explicitly are kept whatever their extension; directories
/// are scanned. A path that does not exist is an error.
pub fn scan_paths(paths: &[PathBuf], manifest: &Manifest) -> Result<Vec<PathBuf>> {
    let mut photos = Vec::new();

    for path in paths {
        if path.is_dir() {
            photos.extend(scan_directory(path, manifest));
        } else if path.is_file() {
            photos.push(path.clone());
        } else {
            return Err(SwatchError::Io {
                path: path.clone(),
                message: "No such file or directory".to_string(),
            });
        }
    }

    Ok(photos)
}
