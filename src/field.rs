//! The particle collection and how it is sampled from a mask.
//!
//! A field is built once per mask:
//!
//! 1. Count the qualifying (opaque) mask pixels.
//! 2. Pick a target count: the requested one, or `ceil(canvas area / (30 * particle size))`.
//! 3. Clamp the target to the qualifying count.
//! 4. Keep each qualifying pixel independently with probability
//!    `target / qualifying`. The resulting count is therefore only
//!    approximately the target; when the target covers every qualifying
//!    pixel, all of them are kept and the count is exact.
//! 5. Map kept pixels to canvas coordinates, `floor(x / mask width * canvas width) + padding`,
//!    and create a particle there with a random density.
//! 6. Insert each particle into the spatial grid, or leave it off-grid when
//!    its position lies outside the canvas.
//!
//! Particles never come or go after the build; a new mask means a new field.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::ParticleTextConfig;
use crate::input::Pointer;
use crate::mask::OpacityMask;
use crate::particle::Particle;
use crate::spatial::{ParticleId, SpatialGrid};
use crate::visuals::{CanvasSize, Color};

/// Canvas pixels per particle at particle size 1.
pub const AREA_PER_PARTICLE: f32 = 30.0;

/// Everything a build needs besides the mask.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldParams {
    pub canvas: CanvasSize,
    /// Offset added to every mapped pixel.
    pub padding: Vec2,
    pub particle_radius: f32,
    pub color: Color,
    /// Requested particle count. `None` or zero derives it from the canvas area.
    pub target_count: Option<u32>,
    /// Pointer reach and grid cell size.
    pub interaction_radius: f32,
}

impl FieldParams {
    pub fn from_config(config: &ParticleTextConfig, canvas: CanvasSize) -> Self {
        Self {
            canvas,
            padding: config.padding(),
            particle_radius: config.particle_size,
            color: config.color,
            target_count: config.target_particles(),
            interaction_radius: config.interaction_radius(),
        }
    }
}

/// Default particle count for a canvas: `ceil(area / (30 * particle_radius))`.
pub fn default_particle_count(canvas: CanvasSize, particle_radius: f32) -> usize {
    (canvas.area() / (AREA_PER_PARTICLE * particle_radius)).ceil() as usize
}

/// All particles of a scene plus the grid that indexes them.
#[derive(Debug, Clone)]
pub struct ParticleField {
    pub(crate) particles: Vec<Particle>,
    pub(crate) grid: SpatialGrid,
    canvas: CanvasSize,
    color: Color,
    interaction_radius: f32,
    qualifying: usize,
    target: usize,
}

impl ParticleField {
    /// Build a field, sampling with an entropy-seeded generator.
    pub fn build(mask: &OpacityMask, params: &FieldParams) -> Self {
        let mut rng = SmallRng::from_entropy();
        Self::build_with_rng(mask, params, &mut rng)
    }

    /// Build a field with a caller-provided generator, for reproducible sampling.
    pub fn build_with_rng<R: Rng + ?Sized>(mask: &OpacityMask, params: &FieldParams, rng: &mut R) -> Self {
        let canvas = params.canvas;
        let qualifying = mask.qualifying_count();
        let requested = match params.target_count {
            Some(n) if n > 0 => n as usize,
            _ => default_particle_count(canvas, params.particle_radius),
        };
        let target = requested.min(qualifying);
        let keep_all = target >= qualifying;
        let probability = if qualifying == 0 {
            0.0
        } else {
            target as f64 / qualifying as f64
        };

        let mut grid = SpatialGrid::new(
            canvas.width as f32,
            canvas.height as f32,
            params.interaction_radius,
        );

        // Mask pixels to canvas pixels: floor(x / mask_width * canvas_width)
        let map_axis = |pixel: u32, mask_len: u32, canvas_len: u32| {
            (pixel as f64 / mask_len.max(1) as f64 * canvas_len as f64).floor() as f32
        };

        let mut particles = Vec::with_capacity(target);
        for (x, y) in mask.opaque_pixels() {
            if !keep_all && !rng.gen_bool(probability) {
                continue;
            }
            let mapped = Vec2::new(
                map_axis(x, mask.width(), canvas.width),
                map_axis(y, mask.height(), canvas.height),
            );
            let mut particle = Particle::with_random_density(mapped + params.padding, params.particle_radius, rng);

            let id = particles.len();
            particle.cell = grid.cell_of(particle.position);
            if let Some(cell) = particle.cell {
                grid.insert(id, cell);
            }
            particles.push(particle);
        }

        log::info!(
            "Built particle field: {} qualifying pixels, target {}, sampled {}, grid {}x{} (cell {})",
            qualifying,
            target,
            particles.len(),
            grid.cols(),
            grid.rows(),
            params.interaction_radius
        );

        Self {
            particles,
            grid,
            canvas,
            color: params.color,
            interaction_radius: params.interaction_radius,
            qualifying,
            target,
        }
    }

    /// A field with no particles; frames only paint the background.
    pub fn empty(canvas: CanvasSize, interaction_radius: f32) -> Self {
        Self {
            particles: Vec::new(),
            grid: SpatialGrid::new(canvas.width as f32, canvas.height as f32, interaction_radius),
            canvas,
            color: Color::BLACK,
            interaction_radius,
            qualifying: 0,
            target: 0,
        }
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Canvas the field was built for.
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn interaction_radius(&self) -> f32 {
        self.interaction_radius
    }

    /// Opaque pixels the mask offered.
    pub fn qualifying_pixels(&self) -> usize {
        self.qualifying
    }

    /// Particle count the sampler aimed for, after clamping.
    pub fn target_count(&self) -> usize {
        self.target
    }

    /// Update one particle's grid membership after it moved.
    pub fn relocate(&mut self, id: ParticleId) -> bool {
        match self.particles.get_mut(id) {
            Some(particle) => self.grid.relocate(id, particle),
            None => false,
        }
    }

    /// Push the particles around a moving pointer.
    ///
    /// The 3x3 neighborhood is collected before any particle moves, so a
    /// particle that changes cells mid-pass is neither revisited nor skipped.
    /// Returns `(pushed, relocated)`.
    pub(crate) fn push_near(&mut self, pointer: &Pointer) -> (usize, usize) {
        let Some(position) = pointer.position() else {
            return (0, 0);
        };
        if !pointer.moved_this_frame() {
            return (0, 0);
        }

        let mut pushed = 0;
        let mut relocated = 0;
        for id in self.grid.neighbors_of(position) {
            if self.particles[id].push(pointer, self.interaction_radius) {
                pushed += 1;
                if self.relocate(id) {
                    relocated += 1;
                }
            }
        }
        (pushed, relocated)
    }

    /// Pull every displaced particle one step toward home. Returns `(restored, relocated)`.
    pub(crate) fn restore_all(&mut self) -> (usize, usize) {
        let mut restored = 0;
        let mut relocated = 0;
        for id in 0..self.particles.len() {
            if self.particles[id].restore() {
                restored += 1;
                if self.relocate(id) {
                    relocated += 1;
                }
            }
        }
        (restored, relocated)
    }

    /// Whether every particle's cached cell matches both its position and
    /// the grid's membership.
    pub fn is_grid_consistent(&self) -> bool {
        let mut members = 0;
        for (id, particle) in self.particles.iter().enumerate() {
            if self.grid.cell_of(particle.position) != particle.cell {
                return false;
            }
            if let Some(cell) = particle.cell {
                if !self.grid.contains(id, cell) {
                    return false;
                }
                members += 1;
            }
        }
        members == self.grid.member_count()
    }
}
