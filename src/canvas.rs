//! CPU renderer for headless snapshots.

use std::path::Path;

use glam::Vec2;
use image::{Rgba, RgbaImage};

use crate::visuals::{CanvasSize, Color, Renderer};

/// An RGBA8 pixel buffer that answers draw requests on the CPU.
///
/// Circles are blended source-over; the background fill replaces pixels
/// outright, so a transparent background clears the canvas.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    image: RgbaImage,
}

impl PixelCanvas {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            image: RgbaImage::new(size.width, size.height),
        }
    }

    pub fn size(&self) -> CanvasSize {
        let (width, height) = self.image.dimensions();
        CanvasSize::new(width, height)
    }

    /// Color at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image
            .get_pixel_checked(x, y)
            .map(|px| Color::rgba(px[0], px[1], px[2], px[3]))
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Write the canvas as an image; the format follows the extension.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.image.save(path)
    }
}

impl Renderer for PixelCanvas {
    fn resize_canvas(&mut self, size: CanvasSize) {
        if size != self.size() {
            log::debug!("Canvas resized to {}x{}", size.width, size.height);
            self.image = RgbaImage::new(size.width, size.height);
        }
    }

    fn fill_background(&mut self, color: Color) {
        let px = Rgba([color.r, color.g, color.b, color.a]);
        for pixel in self.image.pixels_mut() {
            *pixel = px;
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        if radius <= 0.0 || color.a == 0 {
            return;
        }
        let (width, height) = self.image.dimensions();
        let min_x = (center.x - radius).floor().max(0.0) as u32;
        let min_y = (center.y - radius).floor().max(0.0) as u32;
        let max_x = ((center.x + radius).ceil().max(0.0) as u32).min(width);
        let max_y = ((center.y + radius).ceil().max(0.0) as u32).min(height);
        let radius_sq = radius * radius;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let sample = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if sample.distance_squared(center) <= radius_sq {
                    let dst = self.image.get_pixel_mut(x, y);
                    *dst = blend_over(color, *dst);
                }
            }
        }
    }
}

/// Source-over compositing with straight alpha.
fn blend_over(src: Color, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src.a as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |s: u8, d: u8| {
        let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src.r, dst[0]),
        channel(src.g, dst[1]),
        channel(src.b, dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}
