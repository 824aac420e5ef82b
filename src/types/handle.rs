//! Source image handle.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

use crate::error::{Result, SwatchError};

/// Where the pixels of an [`Image`] live.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An encoded image file on disk.
    Path(PathBuf),
    /// An encoded image held in memory.
    Memory(Arc<[u8]>),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            ImageSource::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}

/// A captured or picked photo.
///
/// The handle is read-only: the sampling pipeline decodes it as often as it
/// needs to but never writes back to it. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub source: ImageSource,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn new(source: ImageSource, width: u32, height: u32) -> Self {
        Self {
            source,
            width,
            height,
        }
    }

    /// Open an image file, reading only its dimensions.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (width, height) = image::image_dimensions(path).map_err(|e| SwatchError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read image: {}", e),
        })?;
        Ok(Self::new(ImageSource::Path(path.to_path_buf()), width, height))
    }

    /// Wrap an encoded image buffer, decoding it once to learn its size.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let bytes = bytes.into();
        let decoded = image::load_from_memory(&bytes).map_err(|e| SwatchError::InvalidImage {
            message: format!("Failed to decode image buffer: {}", e),
        })?;
        Ok(Self::new(ImageSource::Memory(bytes), decoded.width(), decoded.height()))
    }

    /// Both dimensions are positive.
    pub fn has_valid_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// A stable textual reference, used for persistence and cache keys.
    ///
    /// In-memory images are named by a digest of their bytes, so two
    /// buffers share a reference only when their contents match.
    pub fn reference(&self) -> String {
        match &self.source {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Memory(bytes) => {
                let mut hasher = DefaultHasher::new();
                bytes.hash(&mut hasher);
                format!("memory:{}:{:016x}", bytes.len(), hasher.finish())
            }
        }
    }

    /// Decode the full image.
    pub fn load(&self) -> image::ImageResult<DynamicImage> {
        match &self.source {
            ImageSource::Path(path) => image::open(path),
            ImageSource::Memory(bytes) => image::load_from_memory(bytes),
        }
    }
}
