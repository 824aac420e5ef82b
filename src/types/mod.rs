//! Core domain types for swatchcam.
//!
//! - `Rgb` - colour triple with `#rrggbb` formatting
//! - `Image` - read-only handle to a captured photo
//! - `SamplePoint` / `ColorSample` - where a colour was read and what it was
//! - `PaletteResult` / `PaletteEntry` - build output and its persisted form

mod colour;
mod handle;
mod palette;
mod sample;

pub use colour::Rgb;
pub use handle::{Image, ImageSource};
pub use palette::{PaletteEntry, PaletteResult, RegionArtifact, RegionPolicy};
pub use sample::{ColorSample, SamplePoint};
