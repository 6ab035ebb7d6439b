//! The per-frame driver.
//!
//! A [`Simulation`] owns everything a scene mutates: the field, its grid and
//! the pointer. The host calls [`Simulation::frame`] once per display
//! refresh; nothing else touches particle state, so no locking is needed.
//!
//! One frame:
//!
//! 1. Issue the canvas size request if the field was just (re)built.
//! 2. Paint the background.
//! 3. If the pointer moved since the last frame, push the particles in the
//!    3x3 cells around it and relocate the ones that moved.
//! 4. Restore every displaced particle and relocate it.
//! 5. Draw every particle.
//! 6. Consume the pointer's move flag.
//!
//! A stationary pointer never pushes twice: step 3 only runs on the frame
//! right after a move, while step 4 runs every frame.
//!
//! # Example
//!
//! ```ignore
//! use glyphdust::prelude::*;
//!
//! let config = ParticleTextConfig::default();
//! let mask = OpacityMask::from_image_file("logo.png")?;
//! let canvas = CanvasSize::new(mask.width(), mask.height());
//! let mut sim = Simulation::from_mask(&mask, canvas, config);
//!
//! let mut canvas = PixelCanvas::new(canvas);
//! sim.pointer_mut().move_to(Vec2::new(40.0, 12.0));
//! let stats = sim.frame(&mut canvas);
//! ```

use crate::config::ParticleTextConfig;
use crate::error::RasterError;
use crate::field::{FieldParams, ParticleField};
use crate::input::Pointer;
use crate::mask::{OpacityMask, Rasterizer};
use crate::text::canvas_for_text;
use crate::visuals::{CanvasSize, Color, Renderer};

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// 1-based index of the frame.
    pub frame: u64,
    /// Particles the pointer displaced.
    pub pushed: usize,
    /// Particles that stepped toward home.
    pub restored: usize,
    /// Grid membership changes, across both phases.
    pub relocated: usize,
}

/// A running particle text scene.
pub struct Simulation {
    config: ParticleTextConfig,
    field: ParticleField,
    pointer: Pointer,
    frame: u64,
    canvas_pending: bool,
    attached: bool,
}

impl Simulation {
    /// Wrap an already built field.
    pub fn new(field: ParticleField, config: ParticleTextConfig) -> Self {
        Self {
            config,
            field,
            pointer: Pointer::new(),
            frame: 0,
            canvas_pending: true,
            attached: true,
        }
    }

    /// Build a field from `mask` onto a `canvas`-sized surface.
    pub fn from_mask(mask: &OpacityMask, canvas: CanvasSize, config: ParticleTextConfig) -> Self {
        let field = ParticleField::build(mask, &FieldParams::from_config(&config, canvas));
        Self::new(field, config)
    }

    /// A scene with no particles on a padding-sized canvas. Frames paint the
    /// background only.
    pub fn blank(config: ParticleTextConfig) -> Self {
        let canvas = canvas_for_text(0.0, 0.0, config.padding());
        let mask = OpacityMask::blank(canvas.width, canvas.height);
        Self::from_mask(&mask, canvas, config)
    }

    /// Rasterize `config.text` and build a field from it.
    ///
    /// Empty text builds no particles; the canvas is then only the padding.
    pub fn from_text<R: Rasterizer + ?Sized>(
        rasterizer: &R,
        config: ParticleTextConfig,
    ) -> Result<Self, RasterError> {
        if config.text.is_empty() {
            return Ok(Self::blank(config));
        }

        let raster = rasterizer.rasterize(&config.text, config.font_size, config.padding())?;
        Ok(Self::from_mask(&raster.mask, raster.canvas, config))
    }

    /// Run one frame and send its draw requests to `renderer`.
    ///
    /// Does nothing after [`detach`](Self::detach).
    pub fn frame<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> FrameStats {
        if !self.attached {
            return FrameStats::default();
        }

        if self.canvas_pending {
            renderer.resize_canvas(self.field.canvas());
            self.canvas_pending = false;
        }
        renderer.fill_background(self.config.background_color);

        let stats = self.step();

        let color = self.field.color();
        for particle in self.field.particles() {
            renderer.fill_circle(particle.position, particle.radius, color);
        }
        stats
    }

    /// Advance the physics by one frame without drawing.
    pub fn step(&mut self) -> FrameStats {
        if !self.attached {
            return FrameStats::default();
        }
        self.frame += 1;

        let (pushed, pushed_relocated) = self.field.push_near(&self.pointer);
        let (restored, restored_relocated) = self.field.restore_all();
        self.pointer.consume();

        let stats = FrameStats {
            frame: self.frame,
            pushed,
            restored,
            relocated: pushed_relocated + restored_relocated,
        };
        log::trace!("{:?}", stats);
        stats
    }

    /// Discard every particle and build a fresh field from a new mask.
    ///
    /// The pointer keeps its position; the next frame re-issues the canvas
    /// size request.
    pub fn rebuild(&mut self, mask: &OpacityMask, canvas: CanvasSize) {
        let params = FieldParams::from_config(&self.config, canvas);
        self.field = ParticleField::build(mask, &params);
        self.canvas_pending = true;
        self.attached = true;
        log::info!("Rebuilt field with {} particles", self.field.len());
    }

    /// Stop the scene and release its particles. Later frames are no-ops.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.field = ParticleField::empty(CanvasSize::default(), self.config.interaction_radius());
        self.pointer = Pointer::new();
        log::info!("Detached after {} frames", self.frame);
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// Pointer state for the input path to write into.
    pub fn pointer_mut(&mut self) -> &mut Pointer {
        &mut self.pointer
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn config(&self) -> &ParticleTextConfig {
        &self.config
    }

    pub fn background(&self) -> Color {
        self.config.background_color
    }

    /// Frames run since creation.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Surface size the field was built for.
    pub fn canvas_size(&self) -> CanvasSize {
        self.field.canvas()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[derive(Default)]
    struct Recorder {
        resized: Vec<CanvasSize>,
        backgrounds: Vec<Color>,
        circles: Vec<(Vec2, f32, Color)>,
    }

    impl Renderer for Recorder {
        fn resize_canvas(&mut self, size: CanvasSize) {
            self.resized.push(size);
        }

        fn fill_background(&mut self, color: Color) {
            self.backgrounds.push(color);
        }

        fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
            self.circles.push((center, radius, color));
        }
    }

    fn dense_sim() -> Simulation {
        let config = ParticleTextConfig {
            num_particles: Some(100_000),
            color: Color::rgb(200, 10, 10),
            background_color: Color::WHITE,
            font_size: 0.0,
            mouse_radius: Some(10.0),
            ..Default::default()
        };
        let mask = OpacityMask::new(20, 20, vec![255; 400]).unwrap();
        Simulation::from_mask(&mask, CanvasSize::new(20, 20), config)
    }

    #[test]
    fn test_frame_draws_background_then_particles() {
        let mut sim = dense_sim();
        let mut recorder = Recorder::default();
        let stats = sim.frame(&mut recorder);

        assert_eq!(stats.frame, 1);
        assert_eq!(recorder.resized, vec![CanvasSize::new(20, 20)]);
        assert_eq!(recorder.backgrounds, vec![Color::WHITE]);
        assert_eq!(recorder.circles.len(), 400);
        assert!(recorder.circles.iter().all(|&(_, r, c)| r == 2.0 && c == Color::rgb(200, 10, 10)));
    }

    #[test]
    fn test_canvas_request_once_per_build() {
        let mut sim = dense_sim();
        let mut recorder = Recorder::default();
        sim.frame(&mut recorder);
        sim.frame(&mut recorder);
        assert_eq!(recorder.resized.len(), 1);

        sim.rebuild(&OpacityMask::blank(8, 8), CanvasSize::new(8, 8));
        sim.frame(&mut recorder);
        assert_eq!(recorder.resized, vec![CanvasSize::new(20, 20), CanvasSize::new(8, 8)]);
        assert!(sim.field().is_empty());
    }

    #[test]
    fn test_push_is_edge_triggered() {
        let mut sim = dense_sim();
        sim.pointer_mut().move_to(Vec2::new(10.0, 10.0));

        let first = sim.step();
        assert!(first.pushed > 0);
        assert!(!sim.pointer().moved_this_frame());

        let second = sim.step();
        assert_eq!(second.pushed, 0);
        assert!(second.restored > 0);
        assert!(sim.field().is_grid_consistent());
    }

    #[test]
    fn test_detach_stops_frames() {
        let mut sim = dense_sim();
        sim.step();
        sim.detach();
        assert!(!sim.is_attached());
        assert!(sim.field().is_empty());

        let mut recorder = Recorder::default();
        assert_eq!(sim.frame(&mut recorder), FrameStats::default());
        assert!(recorder.backgrounds.is_empty());
        assert_eq!(sim.frame_count(), 1);
    }

    #[test]
    fn test_empty_text_builds_nothing() {
        struct Unreachable;
        impl Rasterizer for Unreachable {
            fn rasterize(&self, _: &str, _: f32, _: Vec2) -> Result<crate::mask::RasterizedText, RasterError> {
                Err(RasterError::NoFont)
            }
        }

        let sim = Simulation::from_text(&Unreachable, ParticleTextConfig::default()).unwrap();
        assert!(sim.field().is_empty());
        assert_eq!(sim.canvas_size(), CanvasSize::new(30, 30));
        assert_eq!(Simulation::blank(ParticleTextConfig::default()).canvas_size(), sim.canvas_size());

        let config = ParticleTextConfig {
            text: "hi".into(),
            ..Default::default()
        };
        assert!(matches!(
            Simulation::from_text(&Unreachable, config),
            Err(RasterError::NoFont)
        ));
    }
}
