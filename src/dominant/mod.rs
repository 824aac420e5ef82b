//! Whole-image dominant colour strategy.
//!
//! Instead of sampling points, hand the whole image to a
//! [`DominantColorSource`] and normalise whatever it reports. Sources report
//! different sets of named colours depending on the platform they run on;
//! [`ColorRecord`] models each shape explicitly and [`normalize`] maps every
//! shape onto one ordered list of hex strings, falling back to a single
//! configured colour when the record cannot be used.

mod histogram;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{SourceError, UnrecognizedColorShape};
use crate::sampling::SamplingStrategy;
use crate::types::{Image, PaletteResult, Rgb, SamplePoint};

pub use histogram::HistogramSource;

/// Colour reported when nothing better is available.
pub const DEFAULT_FALLBACK: Rgb = Rgb::FOREST_GREEN;

/// Options passed through to a [`DominantColorSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominantOptions {
    pub fallback: Rgb,
    pub cache: bool,
    pub cache_key: Option<String>,
}

/// Named colours as reported on iOS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IosColors {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub detail: String,
}

/// Named colours as reported on Android and the web.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwatchColors {
    pub dominant: String,
    pub vibrant: String,
    pub dark_vibrant: String,
    pub light_vibrant: String,
    pub muted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_muted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_muted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<String>,
}

/// A dominant-colour result, tagged by the platform that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum ColorRecord {
    Ios(IosColors),
    Android(SwatchColors),
    Web(SwatchColors),
    #[serde(other)]
    Unrecognized,
}

impl ColorRecord {
    /// Parse a record from JSON. Anything that does not fit one of the
    /// known shapes becomes [`ColorRecord::Unrecognized`].
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            warn!("unrecognized colour record: {}", e);
            ColorRecord::Unrecognized
        })
    }

    /// The record's colours in canonical order.
    ///
    /// iOS: primary, secondary, background, detail.
    /// Android and web: dominant, vibrant, dark vibrant, light vibrant, muted.
    pub fn ordered(&self) -> Result<Vec<Rgb>, UnrecognizedColorShape> {
        let raw: Vec<&str> = match self {
            ColorRecord::Ios(c) => vec![
                c.primary.as_str(),
                c.secondary.as_str(),
                c.background.as_str(),
                c.detail.as_str(),
            ],
            ColorRecord::Android(s) | ColorRecord::Web(s) => vec![
                s.dominant.as_str(),
                s.vibrant.as_str(),
                s.dark_vibrant.as_str(),
                s.light_vibrant.as_str(),
                s.muted.as_str(),
            ],
            ColorRecord::Unrecognized => {
                return Err(UnrecognizedColorShape {
                    detail: "unknown platform tag".to_string(),
                })
            }
        };

        raw.into_iter()
            .map(|s| {
                Rgb::from_hex(s).map_err(|_| UnrecognizedColorShape {
                    detail: format!("malformed colour {:?}", s),
                })
            })
            .collect()
    }
}

/// Map a record onto an ordered hex list, or `[fallback]` if it is unusable.
pub fn normalize(record: &ColorRecord, fallback: Rgb) -> Vec<String> {
    match record.ordered() {
        Ok(colors) => colors.into_iter().map(Rgb::to_hex).collect(),
        Err(e) => {
            warn!("{}; using fallback {}", e, fallback);
            vec![fallback.to_hex()]
        }
    }
}

/// Produces named dominant colours for a whole image.
#[allow(async_fn_in_trait)]
pub trait DominantColorSource {
    async fn colors(&self, image: &Image, options: &DominantOptions) -> Result<ColorRecord, SourceError>;
}

/// Whole-image strategy: one call to the source, normalised.
pub struct WholeImageColorExtractor<S> {
    source: S,
    fallback: Rgb,
    cache: bool,
}

impl<S: DominantColorSource> WholeImageColorExtractor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            fallback: DEFAULT_FALLBACK,
            cache: true,
        }
    }

    pub fn with_fallback(mut self, fallback: Rgb) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Ordered hex colours for `image`; never empty.
    pub async fn extract(&self, image: &Image) -> Vec<String> {
        let options = DominantOptions {
            fallback: self.fallback,
            cache: self.cache,
            cache_key: Some(image.reference()),
        };

        match self.source.colors(image, &options).await {
            Ok(record) => normalize(&record, self.fallback),
            Err(e) => {
                warn!("{}; using fallback {}", e, self.fallback);
                vec![self.fallback.to_hex()]
            }
        }
    }
}

impl<S: DominantColorSource> SamplingStrategy for WholeImageColorExtractor<S> {
    async fn sample(&self, image: &Image, _points: &[SamplePoint]) -> PaletteResult {
        PaletteResult {
            colors: self.extract(image).await,
            regions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::PaletteBuilder;
    use crate::types::ImageSource;
    use pretty_assertions::assert_eq;

    struct CannedSource(Result<ColorRecord, SourceError>);

    impl DominantColorSource for CannedSource {
        async fn colors(&self, _: &Image, _: &DominantOptions) -> Result<ColorRecord, SourceError> {
            self.0.clone()
        }
    }

    fn image() -> Image {
        Image::new(ImageSource::Path("photo.jpg".into()), 40, 30)
    }

    fn android() -> ColorRecord {
        ColorRecord::from_json(
            r##"{
                "platform": "android",
                "dominant": "#AA0000",
                "average": "#111111",
                "vibrant": "#00AA00",
                "darkVibrant": "#0000AA",
                "lightVibrant": "#FFF",
                "darkMuted": "#222222",
                "lightMuted": "#333333",
                "muted": "#808080"
            }"##,
        )
    }

    #[test]
    fn test_ios_shape() {
        let record = ColorRecord::from_json(
            r##"{"platform":"ios","primary":"#010203","secondary":"#040506","background":"#070809","detail":"#0A0B0C"}"##,
        );
        assert!(matches!(record, ColorRecord::Ios(_)));
        assert_eq!(
            normalize(&record, DEFAULT_FALLBACK),
            vec!["#010203", "#040506", "#070809", "#0a0b0c"]
        );
    }

    #[test]
    fn test_android_shape() {
        assert_eq!(
            normalize(&android(), DEFAULT_FALLBACK),
            vec!["#aa0000", "#00aa00", "#0000aa", "#ffffff", "#808080"]
        );
    }

    #[test]
    fn test_web_shape() {
        let record = ColorRecord::from_json(
            r##"{"platform":"web","dominant":"#000001","vibrant":"#000002","darkVibrant":"#000003","lightVibrant":"#000004","muted":"#000005","darkMuted":"#000006","lightMuted":"#000007"}"##,
        );
        assert!(matches!(record, ColorRecord::Web(_)));
        assert_eq!(normalize(&record, DEFAULT_FALLBACK).len(), 5);
    }

    #[test]
    fn test_unknown_platform_falls_back() {
        let record = ColorRecord::from_json(r##"{"platform":"windows","accent":"#123456"}"##);
        assert_eq!(record, ColorRecord::Unrecognized);
        assert_eq!(normalize(&record, DEFAULT_FALLBACK), vec!["#228b22"]);
    }

    #[test]
    fn test_missing_tag_or_fields_fall_back() {
        assert_eq!(ColorRecord::from_json(r##"{"dominant":"#123456"}"##), ColorRecord::Unrecognized);
        assert_eq!(
            ColorRecord::from_json(r##"{"platform":"ios","primary":"#123456"}"##),
            ColorRecord::Unrecognized
        );
        assert_eq!(ColorRecord::from_json("[]"), ColorRecord::Unrecognized);
    }

    #[test]
    fn test_malformed_colour_falls_back() {
        let record = ColorRecord::Ios(IosColors {
            primary: "#010203".to_string(),
            secondary: "not a colour".to_string(),
            background: "#070809".to_string(),
            detail: "#0a0b0c".to_string(),
        });
        assert!(record.ordered().is_err());
        assert_eq!(normalize(&record, Rgb::WHITE), vec!["#ffffff"]);
    }

    #[test]
    fn test_record_serializes_with_platform_tag() {
        let json = serde_json::to_value(&android()).unwrap();
        assert_eq!(json["platform"], "android");
        assert_eq!(json["darkVibrant"], "#0000AA");
    }

    #[tokio::test]
    async fn test_extractor_normalizes() {
        let extractor = WholeImageColorExtractor::new(CannedSource(Ok(android())));
        assert_eq!(extractor.extract(&image()).await.len(), 5);
    }

    #[tokio::test]
    async fn test_source_error_falls_back() {
        let extractor = WholeImageColorExtractor::new(CannedSource(Err(SourceError::new("offline"))))
            .with_fallback(Rgb::new(1, 2, 3));
        assert_eq!(extractor.extract(&image()).await, vec!["#010203"]);
    }

    #[tokio::test]
    async fn test_builder_produces_no_regions() {
        let builder = PaletteBuilder::new(WholeImageColorExtractor::new(CannedSource(Ok(android()))));
        let result = builder.build_palette(&image()).await.unwrap();
        assert_eq!(result.colors.len(), 5);
        assert!(result.regions.is_empty());
    }

    #[tokio::test]
    async fn test_builder_unrecognized_gives_single_fallback() {
        let builder = PaletteBuilder::new(WholeImageColorExtractor::new(CannedSource(Ok(
            ColorRecord::Unrecognized,
        ))));
        let result = builder.build_palette(&image()).await.unwrap();
        assert_eq!(result.colors, vec!["#228b22"]);
    }
}
