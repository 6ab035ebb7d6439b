//! Per-particle state and the two update rules.
//!
//! A particle remembers where it was born (its base position) and drifts
//! between there and wherever the pointer shoves it. Neither rule schedules
//! itself: the frame step calls [`Particle::push`] on the pointer's neighbors
//! and [`Particle::restore`] on everything displaced, relocating each one in
//! the grid afterwards.

use glam::Vec2;
use rand::Rng;

use crate::input::Pointer;
use crate::spatial::GridCell;

/// Density range, `[MIN_DENSITY, MAX_DENSITY)`.
pub const MIN_DENSITY: f32 = 1.0;
pub const MAX_DENSITY: f32 = 31.0;

/// Each restore closes `1 / RESTORE_DIVISOR` of the gap to the base position.
pub const RESTORE_DIVISOR: f32 = 15.0;

/// A point of the swarm.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Current position in canvas pixels.
    pub position: Vec2,
    base: Vec2,
    /// Drawn radius.
    pub radius: f32,
    /// Scales push strength; heavier particles fly further.
    pub density: f32,
    pub(crate) cell: Option<GridCell>,
}

impl Particle {
    /// A particle resting at `position`, not yet in any grid cell.
    pub fn new(position: Vec2, radius: f32, density: f32) -> Self {
        Self {
            position,
            base: position,
            radius,
            density,
            cell: None,
        }
    }

    /// A particle with a density drawn uniformly from `[1, 31)`.
    pub fn with_random_density<R: Rng + ?Sized>(position: Vec2, radius: f32, rng: &mut R) -> Self {
        Self::new(position, radius, rng.gen_range(MIN_DENSITY..MAX_DENSITY))
    }

    /// Home position, fixed at creation.
    #[inline]
    pub fn base(&self) -> Vec2 {
        self.base
    }

    /// Cached grid cell; `None` while off-grid.
    #[inline]
    pub fn cell(&self) -> Option<GridCell> {
        self.cell
    }

    #[inline]
    pub fn is_displaced(&self) -> bool {
        self.position != self.base
    }

    /// Offset from the base position.
    #[inline]
    pub fn displacement(&self) -> Vec2 {
        self.position - self.base
    }

    /// Shove the particle away from a pointer that moved this frame.
    ///
    /// Applies when the squared distance is below
    /// `interaction_radius² + radius²`; the particle's own footprint widens
    /// the reach slightly. Force falls off linearly in squared distance and is
    /// scaled by density. Returns whether a force was applied; the caller must
    /// relocate the particle afterwards.
    pub fn push(&mut self, pointer: &Pointer, interaction_radius: f32) -> bool {
        if !pointer.moved_this_frame() || interaction_radius <= 0.0 {
            return false;
        }
        let Some(target) = pointer.position() else {
            return false;
        };

        let delta = target - self.position;
        let distance_sq = delta.length_squared();
        let max_distance_sq = interaction_radius * interaction_radius;
        if distance_sq >= max_distance_sq + self.radius * self.radius {
            return false;
        }

        let force = 1.0 - distance_sq / max_distance_sq;
        self.position -= delta / interaction_radius * force * self.density;
        true
    }

    /// Step back toward the base position.
    ///
    /// Each axis closes a fifteenth of its gap, so displacement decays by
    /// 14/15 per call and never overshoots. An axis whose step rounds away to
    /// nothing lands on the base, so the particle settles in finitely many
    /// calls. Returns whether the particle moved; the caller must relocate
    /// it afterwards.
    pub fn restore(&mut self) -> bool {
        if !self.is_displaced() {
            return false;
        }
        let next = self.position - (self.position - self.base) / RESTORE_DIVISOR;
        self.position = Vec2::select(next.cmpeq(self.position), self.base, next);
        true
    }
}
