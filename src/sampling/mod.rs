//! The colour-sampling pipeline.
//!
//! `geometry` picks where to sample, `extractor` crops a region at each
//! point, `decoder` turns region bytes into a colour and `builder` drives the
//! lot. The whole-image alternative lives in [`crate::dominant`].

mod builder;
mod decoder;
mod extractor;
mod geometry;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::discovery::Manifest;
use crate::dominant::{HistogramSource, WholeImageColorExtractor};
use crate::error::Result;
use crate::types::{Image, PaletteResult, SamplePoint};

pub use builder::{PaletteBuilder, PointSample, PointSampler, SamplingStrategy};
pub use decoder::{ColorDecoder, DecoderKind, DEFAULT_PIXEL_OFFSET};
pub use extractor::{
    CropRegionExtractor, CropRequest, CroppedImage, ImageCropper, LocalCropper, RegionExtractor,
    RegionFormat, DEFAULT_TIMEOUT,
};
pub use geometry::{compute_sample_points, SAMPLE_COUNT};

/// Which strategy produces the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Crop and decode a region at each sample point.
    #[default]
    PerPoint,
    /// Ask a dominant-colour source about the whole image.
    WholeImage,
}

/// The strategies the CLI can run, chosen at runtime from the manifest.
pub enum Sampler {
    PerPoint(PointSampler<CropRegionExtractor<LocalCropper>>),
    WholeImage(WholeImageColorExtractor<HistogramSource>),
}

impl Sampler {
    /// Build the configured strategy. Per-point regions are written to
    /// `region_dir`.
    pub fn from_manifest(manifest: &Manifest, region_dir: &Path) -> Result<Self> {
        Ok(match manifest.strategy {
            Strategy::PerPoint => {
                let extractor = CropRegionExtractor::new(LocalCropper::new(region_dir))
                    .with_region_size(manifest.region_size)
                    .with_format(manifest.region_format)
                    .with_timeout(manifest.timeout());
                Sampler::PerPoint(PointSampler::new(extractor, manifest.color_decoder()))
            }
            Strategy::WholeImage => Sampler::WholeImage(
                WholeImageColorExtractor::new(HistogramSource::new())
                    .with_fallback(manifest.fallback_color()?)
                    .with_cache(manifest.cache),
            ),
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Sampler::PerPoint(_) => Strategy::PerPoint,
            Sampler::WholeImage(_) => Strategy::WholeImage,
        }
    }
}

impl SamplingStrategy for Sampler {
    async fn sample(&self, image: &Image, points: &[SamplePoint]) -> PaletteResult {
        match self {
            Sampler::PerPoint(sampler) => sampler.sample(image, points).await,
            Sampler::WholeImage(extractor) => extractor.sample(image, points).await,
        }
    }
}
