//! Palette results and persisted palette entries.

use serde::{Deserialize, Serialize};

use super::Image;

/// The small cropped image produced for one sample point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionArtifact {
    /// Where the cropped image was written.
    pub uri: String,
    /// The encoded bytes of the cropped image.
    pub bytes: Vec<u8>,
}

/// Output of a palette build.
///
/// `colors` and `regions` are dense and in sample order. Under per-point
/// sampling they always have the same length; whole-image sampling produces
/// no regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteResult {
    pub colors: Vec<String>,
    pub regions: Vec<RegionArtifact>,
}

impl PaletteResult {
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn region_uris(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.uri.clone()).collect()
    }
}

/// Whether cropped regions outlive the build that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegionPolicy {
    /// Regions are written next to the palette store and recorded in the entry.
    #[default]
    Persist,
    /// Regions go to a scratch directory and entries are saved without them.
    Ephemeral,
}

/// A saved palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub id: String,
    /// Reference to the full captured image.
    pub image: String,
    /// Region image references, one per successful sample, or empty.
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
}

impl PaletteEntry {
    /// Freeze a finished build into an entry.
    pub fn from_result(
        id: impl Into<String>,
        image: &Image,
        result: &PaletteResult,
        policy: RegionPolicy,
    ) -> Self {
        let regions = match policy {
            RegionPolicy::Persist => result.region_uris(),
            RegionPolicy::Ephemeral => Vec::new(),
        };
        Self {
            id: id.into(),
            image: image.reference(),
            regions,
            colors: result.colors.clone(),
        }
    }
}
