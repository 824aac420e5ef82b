//! In-process dominant colour source.
//!
//! Counts exact pixel frequencies on a thumbnail and names the most common
//! colours by saturation and brightness. No clustering: two colours one
//! step apart are counted separately.

use std::collections::HashMap;
use std::sync::Mutex;

use image::imageops::FilterType;
use log::debug;
use palette::{Hsv, IntoColor, Srgb};

use crate::error::SourceError;
use crate::types::{Image, Rgb};

use super::{ColorRecord, DominantColorSource, DominantOptions, SwatchColors};

/// Longest side of the thumbnail the histogram is taken from.
const THUMBNAIL_SIZE: u32 = 64;

/// How many of the most frequent colours are candidates for a named role.
const CANDIDATES: usize = 16;

/// Brightness below which a colour counts as dark.
const DARK: f32 = 0.5;

/// Brightness at or above which a colour counts as light.
const LIGHT: f32 = 0.7;

/// Histogram-based [`DominantColorSource`]. Reports the web record shape.
#[derive(Debug, Default)]
pub struct HistogramSource {
    cache: Mutex<HashMap<String, ColorRecord>>,
}

impl HistogramSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn cached(&self, key: &str) -> Option<ColorRecord> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, key: String, record: ColorRecord) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, record);
        }
    }
}

impl DominantColorSource for HistogramSource {
    async fn colors(&self, image: &Image, options: &DominantOptions) -> Result<ColorRecord, SourceError> {
        let key = options.cache_key.as_ref().filter(|_| options.cache);

        if let Some(record) = key.and_then(|k| self.cached(k)) {
            debug!("dominant colours for {} served from cache", image.reference());
            return Ok(record);
        }

        let image = image.clone();
        let record = tokio::task::spawn_blocking(move || analyse(&image))
            .await
            .map_err(|e| SourceError::new(format!("analysis task failed: {}", e)))??;

        if let Some(key) = key {
            self.remember(key.clone(), record.clone());
        }

        Ok(record)
    }
}

/// A candidate colour with its HSV saturation and value.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    rgb: Rgb,
    saturation: f32,
    value: f32,
}

impl Candidate {
    fn new(rgb: Rgb) -> Self {
        let hsv: Hsv = Srgb::new(rgb.r, rgb.g, rgb.b).into_format::<f32>().into_color();
        Self {
            rgb,
            saturation: hsv.saturation,
            value: hsv.value,
        }
    }
}

fn analyse(image: &Image) -> Result<ColorRecord, SourceError> {
    let img = image
        .load()
        .map_err(|e| SourceError::new(format!("failed to decode {}: {}", image.reference(), e)))?;
    let img = if img.width() > THUMBNAIL_SIZE || img.height() > THUMBNAIL_SIZE {
        img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Nearest)
    } else {
        img
    };
    let img = img.to_rgb8();

    let ranked = rank_by_frequency(img.pixels().map(|p| Rgb::from(p.0)));
    let candidates: Vec<Candidate> = ranked.into_iter().take(CANDIDATES).map(Candidate::new).collect();

    let dominant = candidates
        .first()
        .copied()
        .ok_or_else(|| SourceError::new("image has no pixels"))?;

    Ok(ColorRecord::Web(name_roles(dominant, &candidates)))
}

/// Distinct colours, most frequent first. Ties keep the smaller colour first.
fn rank_by_frequency(pixels: impl Iterator<Item = Rgb>) -> Vec<Rgb> {
    let mut counts: HashMap<Rgb, usize> = HashMap::new();
    for rgb in pixels {
        *counts.entry(rgb).or_insert(0) += 1;
    }

    let mut colours: Vec<(Rgb, usize)> = counts.into_iter().collect();
    colours.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    colours.into_iter().map(|(rgb, _)| rgb).collect()
}

fn name_roles(dominant: Candidate, candidates: &[Candidate]) -> SwatchColors {
    let pick = |filter: &dyn Fn(&Candidate) -> bool, vivid: bool| -> String {
        candidates
            .iter()
            .filter(|c| filter(c))
            .fold(None::<Candidate>, |best, c| match best {
                Some(b) if vivid && b.saturation >= c.saturation => Some(b),
                Some(b) if !vivid && b.saturation <= c.saturation => Some(b),
                _ => Some(*c),
            })
            .unwrap_or(dominant)
            .rgb
            .to_hex()
    };

    let mid = |c: &Candidate| c.value >= DARK && c.value < LIGHT;
    let dark = |c: &Candidate| c.value < DARK;
    let light = |c: &Candidate| c.value >= LIGHT;
    let any = |_: &Candidate| true;

    SwatchColors {
        dominant: dominant.rgb.to_hex(),
        vibrant: pick(&any, true),
        dark_vibrant: pick(&dark, true),
        light_vibrant: pick(&light, true),
        muted: pick(&mid, false),
        dark_muted: Some(pick(&dark, false)),
        light_muted: Some(pick(&light, false)),
        average: None,
    }
}
