//! # glyphdust - interactive particle text
//!
//! Renders a string (or any image's opaque pixels) as a swarm of small
//! circles. Moving the pointer through the swarm shoves nearby particles
//! away; every displaced particle then drifts back home a little each frame.
//!
//! ## Quick Start
//!
//! ```ignore
//! use glyphdust::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ParticleTextConfig {
//!         text: "Hello".into(),
//!         font_size: 64.0,
//!         ..Default::default()
//!     };
//!     let font = FontRasterizer::from_file("DejaVuSans.ttf")?;
//!     let simulation = Simulation::from_text(&font, config)?;
//!     glyphdust::window::run(simulation)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Field
//!
//! A [`ParticleField`] is sampled once from an [`OpacityMask`]: each pixel
//! with alpha above 128 may become a particle, up to a target count derived
//! from the canvas area and particle size.
//!
//! ### Spatial grid
//!
//! Particles are bucketed in a [`SpatialGrid`] whose cells are as wide as the
//! pointer's interaction radius, so finding the particles the pointer can
//! reach means looking at nine cells.
//!
//! ### Frames
//!
//! [`Simulation::frame`] pushes the particles near a freshly moved pointer,
//! restores every displaced particle and hands draw requests to a
//! [`Renderer`]. [`PixelCanvas`] draws on the CPU; the window host draws with
//! `wgpu`.

pub mod canvas;
pub mod config;
pub mod error;
pub mod field;
pub mod gpu;
pub mod input;
pub mod mask;
pub mod particle;
pub mod simulation;
pub mod spatial;
pub mod text;
pub mod time;
pub mod visuals;
pub mod window;

pub use canvas::PixelCanvas;
pub use config::ParticleTextConfig;
pub use error::{ConfigError, GpuError, MaskError, ParseColorError, RasterError, RunError};
pub use field::{FieldParams, ParticleField};
pub use glam::Vec2;
pub use input::Pointer;
pub use mask::{OpacityMask, RasterizedText, Rasterizer};
pub use particle::Particle;
pub use simulation::{FrameStats, Simulation};
pub use spatial::{GridCell, ParticleId, SpatialGrid};
pub use text::FontRasterizer;
pub use visuals::{CanvasSize, Color, Renderer};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use glyphdust::prelude::*;
/// ```
pub mod prelude {
    pub use crate::canvas::PixelCanvas;
    pub use crate::config::ParticleTextConfig;
    pub use crate::field::{FieldParams, ParticleField};
    pub use crate::input::Pointer;
    pub use crate::mask::{OpacityMask, Rasterizer};
    pub use crate::simulation::{FrameStats, Simulation};
    pub use crate::text::FontRasterizer;
    pub use crate::visuals::{CanvasSize, Color, Renderer};
    pub use crate::Vec2;
}
