//! Project manifest (swatchcam.yaml) parsing.
//!
//! The manifest configures the sampling pipeline and where palettes are
//! stored. Every field has a default, so an empty file is valid.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dominant::DEFAULT_FALLBACK;
use crate::error::{Result, SwatchError};
use crate::sampling::{ColorDecoder, DecoderKind, RegionFormat, Strategy, DEFAULT_PIXEL_OFFSET};
use crate::types::{RegionPolicy, Rgb};

/// Pipeline configuration loaded from swatchcam.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Per-point sampling or whole-image dominant colours.
    pub strategy: Strategy,

    /// Side length of each cropped region, in pixels.
    pub region_size: u32,

    /// Encoding for cropped regions.
    pub region_format: RegionFormat,

    /// How region bytes are turned into a colour.
    pub decoder: DecoderKind,

    /// Byte offset of the first channel for the fixed-offset decoder.
    pub pixel_offset: usize,

    /// Whether cropped regions are kept with saved palettes.
    pub region_policy: RegionPolicy,

    /// Directory holding the palette store and persisted regions.
    pub data_dir: PathBuf,

    /// Upper bound on a single crop, in milliseconds.
    pub timeout_ms: u64,

    /// Colour used when the whole-image strategy has nothing better.
    pub fallback: String,

    /// Memoise whole-image results per image.
    pub cache: bool,

    /// Patterns to skip when scanning directories for photos.
    pub excludes: Vec<String>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            region_size: 1,
            region_format: RegionFormat::default(),
            decoder: DecoderKind::default(),
            pixel_offset: DEFAULT_PIXEL_OFFSET,
            region_policy: RegionPolicy::default(),
            data_dir: PathBuf::from(".swatchcam"),
            timeout_ms: 5000,
            fallback: DEFAULT_FALLBACK.to_hex(),
            cache: true,
            excludes: vec![],
        }
    }
}

impl Manifest {
    /// Load manifest from a swatchcam.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SwatchError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let manifest: Self = serde_yaml::from_str(content).map_err(|e| SwatchError::Config {
            message: format!("Invalid manifest: {}", e),
            help: Some("Check swatchcam.yaml syntax".to_string()),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.region_size == 0 {
            return Err(SwatchError::Config {
                message: "region_size must be at least 1".to_string(),
                help: None,
            });
        }
        self.fallback_color()?;
        Ok(())
    }

    pub fn fallback_color(&self) -> Result<Rgb> {
        Rgb::from_hex(&self.fallback)
    }

    pub fn color_decoder(&self) -> ColorDecoder {
        ColorDecoder::from_kind(self.decoder, self.pixel_offset)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn store_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Where cropped regions go. Only saved palettes under the persist
    /// policy get a permanent location.
    pub fn region_dir(&self, saving: bool) -> PathBuf {
        match (saving, self.region_policy) {
            (true, RegionPolicy::Persist) => self.data_dir.join("regions"),
            _ => std::env::temp_dir().join("swatchcam-regions"),
        }
    }

    /// Check if a path should be skipped when scanning for photos.
    ///
    /// Anything under the data directory is always skipped so stored
    /// regions are never sampled as photos. A relative data directory
    /// matches wherever it appears in the path.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.is_in_data_dir(path) {
            return true;
        }

        let path_str = path.to_string_lossy();
        self.excludes
            .iter()
            .any(|pattern| Self::matches_pattern(&path_str, pattern))
    }

    fn is_in_data_dir(&self, path: &Path) -> bool {
        let data = normal_components(&self.data_dir);
        let target = normal_components(path);
        if data.is_empty() {
            return false;
        }

        if self.data_dir.is_absolute() {
            if target.starts_with(&data) {
                return true;
            }
            // Relative paths are resolved against the working directory
            return !path.is_absolute()
                && std::env::current_dir()
                    .map(|cwd| normal_components(&cwd.join(path)).starts_with(&data))
                    .unwrap_or(false);
        }

        target.windows(data.len()).any(|w| w == data.as_slice())
    }

    /// Simple glob pattern matching.
    fn matches_pattern(path: &str, pattern: &str) -> bool {
        if let Some(suffix) = pattern.strip_prefix("**/") {
            if let Some(dir) = suffix.strip_suffix("/*") {
                return path.contains(&format!("/{}/", dir)) || path.starts_with(&format!("{}/", dir));
            }
            return path.ends_with(suffix);
        }

        if let Some(suffix) = pattern.strip_prefix('*') {
            if !pattern.contains('/') {
                return path.ends_with(suffix);
            }
        }

        if let Some(prefix) = pattern.strip_suffix("/*") {
            return path.starts_with(&format!("{}/", prefix)) || path.contains(&format!("/{}/", prefix));
        }

        path == pattern || path.ends_with(&format!("/{}", pattern))
    }
}

/// Path components with `.` segments dropped.
fn normal_components(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
