//! Palette card export.
//!
//! A card is the photo thumbnail with a row of equal swatches beneath it,
//! one per palette colour.

mod png;

pub use png::{render_card, swatch_strip, write_palette_card, CardOptions, MAX_SWATCH_SIZE};
