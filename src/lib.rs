//! swatchcam - Sample colour palettes from photos
//!
//! A library for picking a handful of representative colours out of a photo,
//! either by cropping and decoding fixed sample points or by asking a
//! dominant-colour source about the whole image, and for keeping the
//! resulting palettes in a small JSON store.

pub mod cli;
pub mod discovery;
pub mod dominant;
pub mod error;
pub mod output;
pub mod render;
pub mod sampling;
pub mod store;
pub mod types;

pub use discovery::{load_manifest, scan_paths, Manifest};
pub use dominant::{
    normalize, ColorRecord, DominantColorSource, DominantOptions, HistogramSource,
    WholeImageColorExtractor, DEFAULT_FALLBACK,
};
pub use error::{Result, SwatchError};
pub use render::{render_card, write_palette_card, CardOptions};
pub use sampling::{
    compute_sample_points, ColorDecoder, CropRegionExtractor, ImageCropper, LocalCropper,
    PaletteBuilder, PointSampler, RegionExtractor, Sampler, SamplingStrategy, Strategy,
    DEFAULT_PIXEL_OFFSET,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, PaletteRepository, PALETTES_KEY};
pub use types::{
    ColorSample, Image, ImageSource, PaletteEntry, PaletteResult, RegionArtifact, RegionPolicy,
    Rgb, SamplePoint,
};
