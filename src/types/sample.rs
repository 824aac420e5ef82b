//! Sample coordinates and the colours read at them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Rgb;

/// A pixel coordinate chosen for colour extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplePoint {
    pub x: u32,
    pub y: u32,
}

impl SamplePoint {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for SamplePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The colour read at one sample point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSample {
    pub color: Rgb,
    pub point: SamplePoint,
}

impl ColorSample {
    pub fn hex(&self) -> String {
        self.color.to_hex()
    }
}
