//! Region byte decoding.
//!
//! Two ways to turn the encoded bytes of a cropped region into a colour:
//!
//! - **Fixed offset.** Read three consecutive bytes at a known position and
//!   treat them as R, G, B. This is not a container parser. The offset skips
//!   a header whose length is a property of one particular encoder; if that
//!   encoder changes its header layout the decoder keeps returning colours,
//!   just wrong ones. [`DEFAULT_PIXEL_OFFSET`] is the value that matched the
//!   JPEG output of the mobile crop pipeline.
//! - **Container.** Decode the region with the `image` crate and read its
//!   first pixel. Slower, but independent of header layout.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::types::Rgb;

/// Byte offset of the first colour channel for the fixed-offset decoder.
pub const DEFAULT_PIXEL_OFFSET: usize = 20;

/// Decoder selection as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DecoderKind {
    #[default]
    Container,
    FixedOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    FixedOffset(usize),
    Container,
}

/// Turns encoded region bytes into an RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorDecoder {
    mode: Mode,
}

/// Same decoder a manifest without a `decoder` key selects.
impl Default for ColorDecoder {
    fn default() -> Self {
        Self::from_kind(DecoderKind::default(), DEFAULT_PIXEL_OFFSET)
    }
}

impl ColorDecoder {
    /// Read R, G, B from `bytes[offset..offset + 3]`.
    pub const fn fixed_offset(offset: usize) -> Self {
        Self {
            mode: Mode::FixedOffset(offset),
        }
    }

    /// Decode the region as an image and read its top-left pixel.
    pub const fn container() -> Self {
        Self {
            mode: Mode::Container,
        }
    }

    pub fn from_kind(kind: DecoderKind, offset: usize) -> Self {
        match kind {
            DecoderKind::Container => Self::container(),
            DecoderKind::FixedOffset => Self::fixed_offset(offset),
        }
    }

    /// The configured offset, if this is a fixed-offset decoder.
    pub fn offset(&self) -> Option<usize> {
        match self.mode {
            Mode::FixedOffset(offset) => Some(offset),
            Mode::Container => None,
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Rgb, DecodeError> {
        match self.mode {
            Mode::FixedOffset(offset) => decode_at(bytes, offset),
            Mode::Container => decode_container(bytes),
        }
    }

    /// Decode and format as `#rrggbb`.
    pub fn decode_hex(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        self.decode(bytes).map(Rgb::to_hex)
    }
}

fn decode_at(bytes: &[u8], offset: usize) -> Result<Rgb, DecodeError> {
    let required = offset.saturating_add(3);
    match bytes.get(offset..required) {
        Some(&[r, g, b]) => Ok(Rgb::new(r, g, b)),
        _ => Err(DecodeError::InsufficientData {
            len: bytes.len(),
            required,
        }),
    }
}

fn decode_container(bytes: &[u8]) -> Result<Rgb, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::InsufficientData {
            len: 0,
            required: 1,
        });
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| DecodeError::Malformed {
            reason: e.to_string(),
        })?
        .to_rgb8();

    img.pixels()
        .next()
        .map(|p| Rgb::from(p.0))
        .ok_or_else(|| DecodeError::Malformed {
            reason: "region has no pixels".to_string(),
        })
}
