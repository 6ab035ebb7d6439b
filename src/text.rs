//! Text rasterization with `rusttype`.
//!
//! The canvas is sized to the laid-out text plus padding on every side:
//! `advance width + 2 * padding.x` by `ascent - descent + 2 * padding.y`.
//! The text is drawn with its left edge at x = 0 and its baseline at
//! y = `font_size`, and the mask covers the whole canvas.

use std::path::Path;

use glam::Vec2;
use rusttype::{point, Font, Scale};

use crate::error::RasterError;
use crate::mask::{OpacityMask, RasterizedText, Rasterizer};
use crate::visuals::CanvasSize;

/// Rasterizer backed by a TrueType/OpenType font.
pub struct FontRasterizer {
    font: Font<'static>,
}

impl FontRasterizer {
    /// Parse font data already in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RasterError> {
        let font = Font::try_from_vec(data).ok_or(RasterError::InvalidFont)?;
        Ok(Self { font })
    }

    /// Load a font file from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }
}

impl Rasterizer for FontRasterizer {
    fn rasterize(&self, text: &str, font_size: f32, padding: Vec2) -> Result<RasterizedText, RasterError> {
        let scale = Scale::uniform(font_size);
        let v_metrics = self.font.v_metrics(scale);
        let glyphs: Vec<_> = self.font.layout(text, scale, point(0.0, font_size)).collect();

        let text_width = glyphs.last().map_or(0.0, |g| {
            g.position().x + g.unpositioned().h_metrics().advance_width
        });
        let text_height = v_metrics.ascent - v_metrics.descent;
        let canvas = canvas_for_text(text_width, text_height, padding);

        let mut mask = OpacityMask::blank(canvas.width, canvas.height);
        for glyph in &glyphs {
            let Some(bounding_box) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|glyph_x, glyph_y, coverage| {
                let px = bounding_box.min.x + glyph_x as i32;
                let py = bounding_box.min.y + glyph_y as i32;
                if px >= 0 && py >= 0 {
                    mask.accumulate(px as u32, py as u32, coverage_to_alpha(coverage));
                }
            });
        }

        log::debug!(
            "Rasterized {:?} at {}px: canvas {}x{}, {} source pixels",
            text,
            font_size,
            canvas.width,
            canvas.height,
            mask.qualifying_count()
        );

        Ok(RasterizedText { mask, canvas })
    }
}

/// Canvas dimensions for text of the given extent, padded on each side.
pub fn canvas_for_text(text_width: f32, text_height: f32, padding: Vec2) -> CanvasSize {
    let width = (text_width.max(0.0) + padding.x.max(0.0) * 2.0).floor();
    let height = (text_height.max(0.0) + padding.y.max(0.0) * 2.0).floor();
    CanvasSize::new(width as u32, height as u32)
}

fn coverage_to_alpha(coverage: f32) -> u8 {
    (coverage.clamp(0.0, 1.0) * 255.0).round() as u8
}
