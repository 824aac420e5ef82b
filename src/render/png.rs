//! PNG output for palette cards.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba, RgbaImage};
use log::warn;

use crate::error::{Result, SwatchError};
use crate::types::{PaletteEntry, Rgb};

/// Layout of an exported card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardOptions {
    /// Side length of each square swatch, in pixels.
    pub swatch_size: u32,

    /// Draw the photo above the swatches.
    pub thumbnail: bool,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            swatch_size: 64,
            thumbnail: true,
        }
    }
}

/// Largest swatch side accepted on the command line.
pub const MAX_SWATCH_SIZE: u32 = 1024;

/// Upper bound on the pixels of a rendered strip.
const MAX_STRIP_PIXELS: u64 = 64 * 1024 * 1024;

/// Render a row of square swatches.
///
/// Each colour becomes a `scale` x `scale` block (nearest-neighbour, so edges
/// stay crisp). Strips too large to allocate are an export error.
pub fn swatch_strip(colors: &[Rgb], scale: u32) -> Result<RgbaImage> {
    let scale = scale.max(1); // Minimum scale of 1

    let too_large = || SwatchError::Export {
        message: format!(
            "{} swatches of {}px do not fit in one image",
            colors.len(),
            scale
        ),
        help: Some(format!("Use a swatch size of at most {}", MAX_SWATCH_SIZE)),
    };

    let width = u32::try_from(colors.len())
        .ok()
        .and_then(|n| n.checked_mul(scale))
        .ok_or_else(too_large)?;
    if u64::from(width) * u64::from(scale) > MAX_STRIP_PIXELS {
        return Err(too_large());
    }

    let mut img: RgbaImage = ImageBuffer::new(width, scale);

    for (x, colour) in colors.iter().enumerate() {
        let rgba = Rgba(colour.to_rgba());

        // Fill scaled pixels
        for sy in 0..scale {
            for sx in 0..scale {
                img.put_pixel(x as u32 * scale + sx, sy, rgba);
            }
        }
    }

    Ok(img)
}

/// Render the card for a saved palette.
///
/// A photo that can no longer be read is left out with a warning; the
/// swatches are the part that matters.
pub fn render_card(entry: &PaletteEntry, options: &CardOptions) -> Result<RgbaImage> {
    if entry.colors.is_empty() {
        return Err(SwatchError::Export {
            message: format!("palette {} has no colours", entry.id),
            help: Some("Sample the photo again to get a palette".to_string()),
        });
    }

    let colors = entry
        .colors
        .iter()
        .map(|hex| Rgb::from_hex(hex))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| SwatchError::Export {
            message: format!("palette {} holds an invalid colour: {}", entry.id, e),
            help: None,
        })?;

    let strip = swatch_strip(&colors, options.swatch_size)?;
    let thumb = if options.thumbnail {
        load_thumbnail(&entry.image, strip.width())
    } else {
        None
    };

    let Some(thumb) = thumb else {
        return Ok(strip);
    };

    let mut card: RgbaImage = ImageBuffer::new(strip.width(), thumb.height() + strip.height());
    imageops::replace(&mut card, &thumb, 0, 0);
    imageops::replace(&mut card, &strip, 0, i64::from(thumb.height()));
    Ok(card)
}

/// Load the photo and fit it to `width`, keeping its aspect ratio.
fn load_thumbnail(path: &str, width: u32) -> Option<RgbaImage> {
    let photo = match image::open(path) {
        Ok(photo) => photo,
        Err(e) => {
            warn!("leaving photo out of card, cannot read {}: {}", path, e);
            return None;
        }
    };

    if photo.width() == 0 || photo.height() == 0 {
        return None;
    }

    let height = (u64::from(width) * u64::from(photo.height()) / u64::from(photo.width())).max(1);
    let height = u32::try_from(height).ok()?;
    Some(imageops::resize(&photo.to_rgba8(), width, height, FilterType::Triangle))
}

/// Render a palette card and write it as PNG.
pub fn write_palette_card(entry: &PaletteEntry, path: &Path, options: &CardOptions) -> Result<()> {
    let card = render_card(entry, options)?;

    card.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| SwatchError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to write PNG: {}", e),
        })?;

    Ok(())
}
