//! Region extraction.
//!
//! A region is a tiny crop of the source image whose origin is the sample
//! point. Cropping is delegated to an [`ImageCropper`]; [`LocalCropper`] does
//! it in-process with the `image` crate, and tests substitute their own.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::DynamicImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::types::{Image, RegionArtifact, SamplePoint};

/// Default bound on a single crop.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Encoding used for cropped regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegionFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
}

impl RegionFormat {
    pub fn extension(self) -> &'static str {
        match self {
            RegionFormat::Png => "png",
            RegionFormat::Jpeg => "jpg",
            RegionFormat::Bmp => "bmp",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            RegionFormat::Png => image::ImageFormat::Png,
            RegionFormat::Jpeg => image::ImageFormat::Jpeg,
            RegionFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// A crop rectangle plus output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRequest {
    pub origin_x: u32,
    pub origin_y: u32,
    pub width: u32,
    pub height: u32,
    pub format: RegionFormat,
}

impl CropRequest {
    /// A `size`×`size` square anchored at `point`, clamped to the image.
    ///
    /// `point` must lie inside the image; the result is at least 1×1.
    pub fn at(point: SamplePoint, size: u32, image: &Image, format: RegionFormat) -> Self {
        let size = size.max(1);
        Self {
            origin_x: point.x,
            origin_y: point.y,
            width: size.min(image.width.saturating_sub(point.x)).max(1),
            height: size.min(image.height.saturating_sub(point.y)).max(1),
            format,
        }
    }
}

/// What a cropper hands back. `bytes` may be missing if the cropper only
/// produced a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CroppedImage {
    pub uri: String,
    pub bytes: Option<Vec<u8>>,
}

/// Crops a region out of a source image.
#[allow(async_fn_in_trait)]
pub trait ImageCropper {
    async fn crop(&self, image: &Image, request: CropRequest) -> Result<CroppedImage, ExtractionError>;
}

/// Produces the region artifact for one sample point.
#[allow(async_fn_in_trait)]
pub trait RegionExtractor {
    async fn extract_region(
        &self,
        image: &Image,
        point: SamplePoint,
    ) -> Result<RegionArtifact, ExtractionError>;
}

/// [`RegionExtractor`] on top of an [`ImageCropper`], with a per-crop timeout.
pub struct CropRegionExtractor<C> {
    cropper: C,
    region_size: u32,
    format: RegionFormat,
    timeout: Duration,
}

impl<C> CropRegionExtractor<C> {
    /// Single-pixel PNG regions with the default timeout.
    pub fn new(cropper: C) -> Self {
        Self {
            cropper,
            region_size: 1,
            format: RegionFormat::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_region_size(mut self, size: u32) -> Self {
        self.region_size = size.max(1);
        self
    }

    pub fn with_format(mut self, format: RegionFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cropper(&self) -> &C {
        &self.cropper
    }
}

impl<C: ImageCropper> RegionExtractor for CropRegionExtractor<C> {
    async fn extract_region(
        &self,
        image: &Image,
        point: SamplePoint,
    ) -> Result<RegionArtifact, ExtractionError> {
        let request = CropRequest::at(point, self.region_size, image, self.format);

        let cropped = tokio::time::timeout(self.timeout, self.cropper.crop(image, request))
            .await
            .map_err(|_| ExtractionError::timeout())??;

        let bytes = cropped
            .bytes
            .ok_or_else(|| ExtractionError::new("crop produced no bytes"))?;
        if bytes.is_empty() {
            return Err(ExtractionError::new("crop produced zero bytes"));
        }

        Ok(RegionArtifact {
            uri: cropped.uri,
            bytes,
        })
    }
}

/// Crops with the `image` crate and writes each region to `output_dir`.
///
/// Decoding and encoding run on tokio's blocking pool. The source is decoded
/// on the first crop and kept for the following crops of the same image. The
/// region file is written only once the crop has finished, so a crop that
/// is dropped on timeout leaves nothing behind.
#[derive(Debug)]
pub struct LocalCropper {
    output_dir: PathBuf,
    counter: AtomicUsize,
    decoded: Mutex<Option<(String, Arc<DynamicImage>)>>,
}

impl LocalCropper {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            counter: AtomicUsize::new(0),
            decoded: Mutex::new(None),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn next_path(&self, request: &CropRequest) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.output_dir.join(format!(
            "region-{}-{}x{}.{}",
            n,
            request.origin_x,
            request.origin_y,
            request.format.extension()
        ))
    }

    fn cached(&self, key: &str) -> Option<Arc<DynamicImage>> {
        let slot = self.decoded.lock().ok()?;
        slot.as_ref()
            .filter(|(cached, _)| cached == key)
            .map(|(_, source)| Arc::clone(source))
    }

    async fn source(&self, image: &Image) -> Result<Arc<DynamicImage>, ExtractionError> {
        let key = image.reference();
        if let Some(source) = self.cached(&key) {
            return Ok(source);
        }

        let owned = image.clone();
        let source = tokio::task::spawn_blocking(move || owned.load())
            .await
            .map_err(|e| ExtractionError::new(format!("decode task failed: {}", e)))?
            .map_err(|e| ExtractionError::new(format!("failed to decode {}: {}", key, e)))?;
        debug!("decoded {} for cropping", key);

        let source = Arc::new(source);
        if let Ok(mut slot) = self.decoded.lock() {
            *slot = Some((key, Arc::clone(&source)));
        }
        Ok(source)
    }
}

impl ImageCropper for LocalCropper {
    async fn crop(&self, image: &Image, request: CropRequest) -> Result<CroppedImage, ExtractionError> {
        let source = self.source(image).await?;
        let path = self.next_path(&request);

        let bytes = tokio::task::spawn_blocking(move || encode_region(&source, request))
            .await
            .map_err(|e| ExtractionError::new(format!("crop task failed: {}", e)))??;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExtractionError::new(format!("failed to create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ExtractionError::new(format!("failed to write {}: {}", path.display(), e)))?;

        Ok(CroppedImage {
            uri: path.display().to_string(),
            bytes: Some(bytes),
        })
    }
}

fn encode_region(source: &DynamicImage, request: CropRequest) -> Result<Vec<u8>, ExtractionError> {
    if request.origin_x >= source.width() || request.origin_y >= source.height() {
        return Err(ExtractionError::new(format!(
            "crop origin ({}, {}) outside {}x{} image",
            request.origin_x,
            request.origin_y,
            source.width(),
            source.height()
        )));
    }

    // JPEG cannot carry alpha, so every region is flattened to RGB
    let region = DynamicImage::ImageRgb8(
        source
            .crop_imm(request.origin_x, request.origin_y, request.width, request.height)
            .to_rgb8(),
    );

    let mut bytes = Vec::new();
    region
        .write_to(&mut Cursor::new(&mut bytes), request.format.image_format())
        .map_err(|e| ExtractionError::new(format!("failed to encode region: {}", e)))?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::ColorDecoder;
    use crate::types::{ImageSource, Rgb};
    use tempfile::tempdir;

    fn gradient_image() -> Image {
        let img = image::RgbImage::from_fn(8, 6, |x, y| image::Rgb([x as u8 * 10, y as u8 * 10, 7]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        Image::from_bytes(bytes).unwrap()
    }

    struct FixedCropper(Option<Vec<u8>>);

    impl ImageCropper for FixedCropper {
        async fn crop(&self, _: &Image, _: CropRequest) -> Result<CroppedImage, ExtractionError> {
            Ok(CroppedImage {
                uri: "mem://region".to_string(),
                bytes: self.0.clone(),
            })
        }
    }

    struct SlowCropper;

    impl ImageCropper for SlowCropper {
        async fn crop(&self, _: &Image, _: CropRequest) -> Result<CroppedImage, ExtractionError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(CroppedImage {
                uri: "late".to_string(),
                bytes: Some(vec![1, 2, 3]),
            })
        }
    }

    #[test]
    fn test_crop_request_clamps_to_image() {
        let image = Image::new(ImageSource::Path("a.png".into()), 10, 8);
        let req = CropRequest::at(SamplePoint::new(8, 7), 4, &image, RegionFormat::Png);
        assert_eq!((req.origin_x, req.origin_y), (8, 7));
        assert_eq!((req.width, req.height), (2, 1));

        let req = CropRequest::at(SamplePoint::new(2, 2), 0, &image, RegionFormat::Png);
        assert_eq!((req.width, req.height), (1, 1));
    }

    #[tokio::test]
    async fn test_local_cropper_writes_region() {
        let dir = tempdir().unwrap();
        let extractor = CropRegionExtractor::new(LocalCropper::new(dir.path()));
        let image = gradient_image();

        let artifact = extractor
            .extract_region(&image, SamplePoint::new(3, 2))
            .await
            .unwrap();

        assert!(Path::new(&artifact.uri).exists());
        assert!(artifact.uri.ends_with("region-0-3x2.png"));
        let colour = ColorDecoder::container().decode(&artifact.bytes).unwrap();
        assert_eq!(colour, Rgb::new(30, 20, 7));

        let region = image::load_from_memory(&artifact.bytes).unwrap();
        assert_eq!((region.width(), region.height()), (1, 1));
    }

    #[tokio::test]
    async fn test_local_cropper_region_size() {
        let dir = tempdir().unwrap();
        let extractor = CropRegionExtractor::new(LocalCropper::new(dir.path()))
            .with_region_size(3)
            .with_format(RegionFormat::Bmp);

        let artifact = extractor
            .extract_region(&gradient_image(), SamplePoint::new(6, 4))
            .await
            .unwrap();

        assert!(artifact.uri.ends_with(".bmp"));
        let region = image::load_from_memory(&artifact.bytes).unwrap();
        assert_eq!((region.width(), region.height()), (2, 2));
    }

    #[tokio::test]
    async fn test_local_cropper_origin_outside() {
        let dir = tempdir().unwrap();
        let cropper = LocalCropper::new(dir.path());
        let image = gradient_image();
        let request = CropRequest {
            origin_x: 50,
            origin_y: 0,
            width: 1,
            height: 1,
            format: RegionFormat::Png,
        };

        let err = cropper.crop(&image, request).await.unwrap_err();
        assert!(err.reason.contains("outside"));
    }

    #[tokio::test]
    async fn test_local_cropper_decodes_source_once() {
        let dir = tempdir().unwrap();
        let photo = dir.path().join("photo.png");
        image::RgbImage::from_pixel(6, 6, image::Rgb([90, 60, 30]))
            .save(&photo)
            .unwrap();
        let image = Image::open(&photo).unwrap();
        let extractor = CropRegionExtractor::new(LocalCropper::new(dir.path().join("regions")));

        extractor.extract_region(&image, SamplePoint::new(1, 1)).await.unwrap();

        // Later crops of the same image reuse the first decode
        std::fs::remove_file(&photo).unwrap();
        let artifact = extractor
            .extract_region(&image, SamplePoint::new(4, 4))
            .await
            .unwrap();
        assert_eq!(
            ColorDecoder::container().decode(&artifact.bytes).unwrap(),
            Rgb::new(90, 60, 30)
        );

        // A different image is decoded afresh
        let other = gradient_image();
        let artifact = extractor
            .extract_region(&other, SamplePoint::new(2, 1))
            .await
            .unwrap();
        assert_eq!(
            ColorDecoder::container().decode(&artifact.bytes).unwrap(),
            Rgb::new(20, 10, 7)
        );
    }

    #[tokio::test]
    async fn test_timed_out_crop_writes_no_file() {
        let dir = tempdir().unwrap();
        let regions = dir.path().join("regions");
        let big = image::RgbImage::from_fn(512, 512, |x, y| image::Rgb([x as u8, y as u8, 0]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(big)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let image = Image::from_bytes(bytes).unwrap();

        let extractor =
            CropRegionExtractor::new(LocalCropper::new(&regions)).with_timeout(Duration::ZERO);
        let err = extractor
            .extract_region(&image, SamplePoint::new(5, 5))
            .await
            .unwrap_err();
        assert_eq!(err, ExtractionError::timeout());

        // Give the abandoned decode time to finish
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!regions.exists());
    }

    #[tokio::test]
    async fn test_unreadable_source() {
        let dir = tempdir().unwrap();
        let extractor = CropRegionExtractor::new(LocalCropper::new(dir.path()));
        let image = Image::new(ImageSource::Path(dir.path().join("missing.png")), 4, 4);

        let err = extractor
            .extract_region(&image, SamplePoint::new(0, 0))
            .await
            .unwrap_err();
        assert!(err.reason.contains("failed to decode"));
    }

    #[tokio::test]
    async fn test_missing_bytes() {
        let extractor = CropRegionExtractor::new(FixedCropper(None));
        let image = Image::new(ImageSource::Path("a.png".into()), 4, 4);

        let err = extractor
            .extract_region(&image, SamplePoint::new(1, 1))
            .await
            .unwrap_err();
        assert_eq!(err, ExtractionError::new("crop produced no bytes"));
    }

    #[tokio::test]
    async fn test_zero_bytes() {
        let extractor = CropRegionExtractor::new(FixedCropper(Some(Vec::new())));
        let image = Image::new(ImageSource::Path("a.png".into()), 4, 4);

        let err = extractor
            .extract_region(&image, SamplePoint::new(1, 1))
            .await
            .unwrap_err();
        assert_eq!(err, ExtractionError::new("crop produced zero bytes"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let extractor =
            CropRegionExtractor::new(SlowCropper).with_timeout(Duration::from_millis(10));
        let image = Image::new(ImageSource::Path("a.png".into()), 4, 4);

        let err = extractor
            .extract_region(&image, SamplePoint::new(1, 1))
            .await
            .unwrap_err();
        assert_eq!(err, ExtractionError::timeout());
    }
}
