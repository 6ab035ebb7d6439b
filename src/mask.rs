//! Opacity masks: the shape the swarm settles into.
//!
//! A mask is a `width` x `height` grid of alpha values (0-255). Pixels whose
//! alpha is above [`ALPHA_THRESHOLD`] qualify as particle sources.
//!
//! Masks come from a [`Rasterizer`] (text drawn with a font) or straight from
//! an image file, in which case only the alpha channel is read.
//!
//! # Example
//!
//! ```ignore
//! use glyphdust::mask::OpacityMask;
//!
//! let mask = OpacityMask::from_image_file("assets/logo.png")?;
//! println!("{} source pixels", mask.qualifying_count());
//! ```

use std::path::Path;

use glam::Vec2;

use crate::error::{MaskError, RasterError};
use crate::visuals::CanvasSize;

/// Pixels with alpha strictly above this value become particle sources.
pub const ALPHA_THRESHOLD: u8 = 128;

/// Per-pixel alpha values, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpacityMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl OpacityMask {
    /// Create a mask from one alpha byte per pixel.
    pub fn new(width: u32, height: u32, alpha: Vec<u8>) -> Result<Self, MaskError> {
        let expected = width as usize * height as usize;
        if alpha.len() != expected {
            return Err(MaskError::SizeMismatch {
                expected,
                actual: alpha.len(),
            });
        }
        Ok(Self { width, height, alpha })
    }

    /// A fully transparent mask. Builds a field with no particles.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0; width as usize * height as usize],
        }
    }

    /// Create a mask from raw RGBA data (4 bytes per pixel), keeping alpha.
    pub fn from_rgba(data: &[u8], width: u32, height: u32) -> Result<Self, MaskError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(MaskError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            alpha: data.chunks_exact(4).map(|px| px[3]).collect(),
        })
    }

    /// Create a mask from the alpha channel of a decoded image.
    pub fn from_dynamic_image(img: &image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            alpha: rgba.pixels().map(|px| px.0[3]).collect(),
        }
    }

    /// Load a mask from an image file (PNG or JPEG).
    ///
    /// Images without an alpha channel are fully opaque.
    pub fn from_image_file<P: AsRef<Path>>(path: P) -> Result<Self, MaskError> {
        let img = image::ImageReader::open(path.as_ref())?
            .with_guessed_format()?
            .decode()?;
        Ok(Self::from_dynamic_image(&img))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Alpha at `(x, y)`, or 0 outside the mask.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.alpha[y as usize * self.width as usize + x as usize]
    }

    /// Whether the pixel qualifies as a particle source.
    #[inline]
    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        self.alpha_at(x, y) > ALPHA_THRESHOLD
    }

    /// Number of qualifying pixels.
    pub fn qualifying_count(&self) -> usize {
        self.alpha.iter().filter(|&&a| a > ALPHA_THRESHOLD).count()
    }

    /// Qualifying pixel coordinates in row-major order.
    pub fn opaque_pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width.max(1) as usize;
        self.alpha
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > ALPHA_THRESHOLD)
            .map(move |(i, _)| ((i % width) as u32, (i / width) as u32))
    }

    /// Raise the alpha at `(x, y)` to at least `alpha`. Out-of-range writes are ignored.
    pub(crate) fn accumulate(&mut self, x: u32, y: u32, alpha: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.alpha[index] = self.alpha[index].max(alpha);
    }
}

/// A rasterized string: its mask plus the canvas it should be drawn on.
#[derive(Debug, Clone)]
pub struct RasterizedText {
    pub mask: OpacityMask,
    /// Canvas size request: text bounds plus padding on each side.
    pub canvas: CanvasSize,
}

/// Turns a string into an opacity mask.
pub trait Rasterizer {
    /// Draw `text` at `font_size` pixels. `padding` is added on each side of
    /// the text bounds when sizing the canvas.
    fn rasterize(&self, text: &str, font_size: f32, padding: Vec2) -> Result<RasterizedText, RasterError>;
}
