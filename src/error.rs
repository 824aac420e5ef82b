use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for swatchcam operations
#[derive(Error, Diagnostic, Debug)]
pub enum SwatchError {
    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(swatchcam::io))]
    Io { path: PathBuf, message: String },

    #[error("Config error: {message}")]
    #[diagnostic(code(swatchcam::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Invalid image: {message}")]
    #[diagnostic(code(swatchcam::image))]
    InvalidImage { message: String },

    #[error(transparent)]
    #[diagnostic(code(swatchcam::geometry))]
    InvalidDimensions(#[from] InvalidDimensions),

    #[error("Palette store is corrupt: {message}")]
    #[diagnostic(
        code(swatchcam::store),
        help("The palette collection will be reset on the next save")
    )]
    StoreCorrupt { message: String },

    #[error("No saved palette with id {id}")]
    #[diagnostic(code(swatchcam::store), help("Run `swatchcam list` to see saved ids"))]
    NotFound { id: String },

    #[error("Export error: {message}")]
    #[diagnostic(code(swatchcam::export))]
    Export {
        message: String,
        #[help]
        help: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, SwatchError>;

/// Image dimensions that cannot carry any sample point.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid dimensions {width}x{height}: width and height must be positive")]
pub struct InvalidDimensions {
    pub width: u32,
    pub height: u32,
}

/// A single region could not be cropped. Never fatal to a palette build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("region extraction failed: {reason}")]
pub struct ExtractionError {
    pub reason: String,
}

impl ExtractionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new("timeout")
    }
}

/// Encoded region bytes did not yield a colour.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("insufficient data: got {len} bytes, need at least {required}")]
    InsufficientData { len: usize, required: usize },

    #[error("malformed region image: {reason}")]
    Malformed { reason: String },
}

/// The dominant-colour collaborator failed outright.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dominant colour source failed: {reason}")]
pub struct SourceError {
    pub reason: String,
}

impl SourceError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A dominant-colour record whose shape or contents could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized colour shape: {detail}")]
pub struct UnrecognizedColorShape {
    pub detail: String,
}
