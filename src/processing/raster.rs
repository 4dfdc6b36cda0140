//! # Raster Decode / Encode
//!
//! Converts image files to and from the flat channel-sample array a container operates on.
//! Only 8-bit RGB images are accepted; output is always written as PNG so that re-encoding
//! never goes through a lossy codec.

use image::{ColorType, DynamicImage, ImageFormat};
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::{Result, StegoError};

/// Number of channel samples per pixel.
pub const CHANNELS: usize = 3;

/// Flattened RGB pixel data in row-major `R, G, B` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub samples: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Raster {
    /// Wrap an existing sample array.
    ///
    /// # Errors
    /// - [`StegoError::UnsupportedLayout`] if the length is not `width * height * 3`
    pub fn new(samples: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if samples.len() != expected {
            return Err(StegoError::UnsupportedLayout(format!(
                "{} samples for a {}x{} RGB image (expected {})",
                samples.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            samples,
            width,
            height,
        })
    }
}

/// Load an image file into a [`Raster`].
///
/// # Errors
/// - The file cannot be opened or decoded
/// - The image is not 8-bit RGB
pub fn decode(path: &Path) -> Result<Raster> {
    let img = image::open(path)?;
    match img {
        DynamicImage::ImageRgb8(buf) => {
            let (width, height) = buf.dimensions();
            debug!("Decoded {} ({}x{})", path.display(), width, height);
            Raster::new(buf.into_raw(), width, height)
        }
        other => Err(StegoError::UnsupportedLayout(format!("{:?}", other.color()))),
    }
}

/// Write `raster` as a PNG next to `path` (same stem, `.png` extension).
///
/// Returns the path actually written.
pub fn encode(raster: &Raster, path: &Path) -> Result<PathBuf> {
    let target = path.with_extension("png");
    image::save_buffer_with_format(
        &target,
        &raster.samples,
        raster.width,
        raster.height,
        ColorType::Rgb8,
        ImageFormat::Png,
    )?;
    debug!("Encoded {} ({}x{})", target.display(), raster.width, raster.height);
    Ok(target)
}
