//! Palette assembly.
//!
//! [`PaletteBuilder`] validates the image, lays out the sample points and
//! hands them to a [`SamplingStrategy`]. [`PointSampler`] is the per-point
//! strategy: crop, decode, skip whatever fails.

use log::{debug, warn};

use crate::error::{Result, SwatchError};
use crate::types::{ColorSample, Image, PaletteResult, RegionArtifact, SamplePoint};

use super::decoder::ColorDecoder;
use super::extractor::RegionExtractor;
use super::geometry::compute_sample_points;

/// Turns an image plus its sample points into a palette.
///
/// Implementations recover from their own failures; the worst outcome is an
/// empty or fallback palette.
#[allow(async_fn_in_trait)]
pub trait SamplingStrategy {
    async fn sample(&self, image: &Image, points: &[SamplePoint]) -> PaletteResult;
}

/// Drives a [`SamplingStrategy`] over validated images.
pub struct PaletteBuilder<S> {
    strategy: S,
}

impl<S: SamplingStrategy> PaletteBuilder<S> {
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Build the palette for `image`.
    ///
    /// Fails with [`SwatchError::InvalidImage`] only when the image has a
    /// zero dimension, in which case the strategy is never invoked. Any
    /// other problem degrades to fewer colours.
    pub async fn build_palette(&self, image: &Image) -> Result<PaletteResult> {
        if !image.has_valid_dimensions() {
            warn!(
                "not sampling {}: image is {}x{}",
                image.reference(),
                image.width,
                image.height
            );
            return Err(SwatchError::InvalidImage {
                message: format!(
                    "{} has dimensions {}x{}",
                    image.reference(),
                    image.width,
                    image.height
                ),
            });
        }

        let points = compute_sample_points(image.width, image.height)?;
        let result = self.strategy.sample(image, &points).await;

        if result.is_empty() {
            warn!("no colours could be sampled from {}", image.reference());
        }

        Ok(result)
    }
}

/// One successful sample together with the region it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointSample {
    pub sample: ColorSample,
    pub region: RegionArtifact,
}

/// Per-point strategy: extract a region at each point, then decode it.
///
/// Points are processed one at a time, in order. A point whose extraction
/// or decoding fails is logged and dropped; it leaves no gap in the output.
pub struct PointSampler<E> {
    extractor: E,
    decoder: ColorDecoder,
}

impl<E: RegionExtractor> PointSampler<E> {
    pub fn new(extractor: E, decoder: ColorDecoder) -> Self {
        Self { extractor, decoder }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Sample every point and keep the ones that produced a colour.
    pub async fn samples(&self, image: &Image, points: &[SamplePoint]) -> Vec<PointSample> {
        let mut samples = Vec::with_capacity(points.len());

        for (i, &point) in points.iter().enumerate() {
            let region = match self.extractor.extract_region(image, point).await {
                Ok(region) => region,
                Err(e) => {
                    warn!("skipping point {} {}: {}", i + 1, point, e);
                    continue;
                }
            };

            let color = match self.decoder.decode(&region.bytes) {
                Ok(color) => color,
                Err(e) => {
                    warn!("skipping point {} {}: {}", i + 1, point, e);
                    continue;
                }
            };

            debug!("point {} {} -> {}", i + 1, point, color);
            samples.push(PointSample {
                sample: ColorSample { color, point },
                region,
            });
        }

        samples
    }
}

impl<E: RegionExtractor> SamplingStrategy for PointSampler<E> {
    async fn sample(&self, image: &Image, points: &[SamplePoint]) -> PaletteResult {
        let (colors, regions) = self
            .samples(image, points)
            .await
            .into_iter()
            .map(|s| (s.sample.hex(), s.region))
            .unzip();

        PaletteResult { colors, regions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::sampling::decoder::DEFAULT_PIXEL_OFFSET;
    use crate::types::ImageSource;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// Encodes the point into the fixed-offset pixel bytes and fails on
    /// chosen call indices.
    struct ScriptedExtractor {
        fail: HashSet<usize>,
        short: HashSet<usize>,
        calls: RefCell<Vec<SamplePoint>>,
    }

    impl ScriptedExtractor {
        fn new(fail: &[usize], short: &[usize]) -> Self {
            Self {
                fail: fail.iter().copied().collect(),
                short: short.iter().copied().collect(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl RegionExtractor for ScriptedExtractor {
        async fn extract_region(
            &self,
            _image: &Image,
            point: SamplePoint,
        ) -> std::result::Result<RegionArtifact, ExtractionError> {
            let index = {
                let mut calls = self.calls.borrow_mut();
                calls.push(point);
                calls.len() - 1
            };

            if self.fail.contains(&index) {
                return Err(ExtractionError::new("crop library error"));
            }

            let mut bytes = vec![0u8; DEFAULT_PIXEL_OFFSET];
            if !self.short.contains(&index) {
                bytes.extend([index as u8, point.x as u8, point.y as u8]);
            }

            Ok(RegionArtifact {
                uri: format!("region-{}", index),
                bytes,
            })
        }
    }

    fn image(width: u32, height: u32) -> Image {
        Image::new(ImageSource::Path("photo.jpg".into()), width, height)
    }

    #[tokio::test]
    async fn test_all_points_succeed() {
        let builder = PaletteBuilder::new(PointSampler::new(
            ScriptedExtractor::new(&[], &[]),
            ColorDecoder::fixed_offset(DEFAULT_PIXEL_OFFSET),
        ));

        let result = builder.build_palette(&image(100, 40)).await.unwrap();

        assert_eq!(
            result.colors,
            vec!["#003214", "#01190a", "#024b0a", "#03191e", "#044b1e"]
        );
        assert_eq!(result.regions.len(), 5);
        assert!(result.colors.iter().all(|c| c.len() == 7));
    }

    #[tokio::test]
    async fn test_failed_points_are_skipped() {
        let builder = PaletteBuilder::new(PointSampler::new(
            ScriptedExtractor::new(&[1, 3], &[]),
            ColorDecoder::fixed_offset(DEFAULT_PIXEL_OFFSET),
        ));

        let result = builder.build_palette(&image(100, 40)).await.unwrap();

        assert_eq!(result.colors, vec!["#003214", "#024b0a", "#044b1e"]);
        assert_eq!(
            result.region_uris(),
            vec!["region-0", "region-2", "region-4"]
        );
        assert_eq!(builder.strategy().extractor().calls(), 5);
    }

    #[tokio::test]
    async fn test_undecodable_region_is_skipped_with_its_region() {
        let builder = PaletteBuilder::new(PointSampler::new(
            ScriptedExtractor::new(&[], &[0]),
            ColorDecoder::fixed_offset(DEFAULT_PIXEL_OFFSET),
        ));

        let result = builder.build_palette(&image(100, 40)).await.unwrap();

        assert_eq!(result.colors.len(), 4);
        assert_eq!(result.regions.len(), 4);
        assert_eq!(result.regions[0].uri, "region-1");
    }

    #[tokio::test]
    async fn test_every_point_fails() {
        let builder = PaletteBuilder::new(PointSampler::new(
            ScriptedExtractor::new(&[0, 1, 2, 3, 4], &[]),
            ColorDecoder::fixed_offset(DEFAULT_PIXEL_OFFSET),
        ));

        let result = builder.build_palette(&image(10, 10)).await.unwrap();

        assert!(result.is_empty());
        assert!(result.regions.is_empty());
    }

    #[tokio::test]
    async fn test_zero_size_image_never_extracts() {
        let builder = PaletteBuilder::new(PointSampler::new(
            ScriptedExtractor::new(&[], &[]),
            ColorDecoder::fixed_offset(DEFAULT_PIXEL_OFFSET),
        ));

        let err = builder.build_palette(&image(0, 0)).await.unwrap_err();

        assert!(matches!(err, SwatchError::InvalidImage { .. }));
        assert_eq!(builder.strategy().extractor().calls(), 0);
    }

    #[tokio::test]
    async fn test_points_visited_in_pattern_order() {
        let sampler = PointSampler::new(ScriptedExtractor::new(&[], &[]), ColorDecoder::fixed_offset(DEFAULT_PIXEL_OFFSET));
        let points = compute_sample_points(8, 8).unwrap();

        let samples = sampler.samples(&image(8, 8), &points).await;

        let visited: Vec<SamplePoint> = samples.iter().map(|s| s.sample.point).collect();
        assert_eq!(visited, points.to_vec());
        assert_eq!(*sampler.extractor().calls.borrow(), points.to_vec());
    }
}
