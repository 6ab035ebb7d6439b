//! Pointer state consumed by the simulation.
//!
//! The host writes pointer moves here as they arrive; the frame step reads
//! them once and then consumes the "moved" flag. Nothing in this module
//! touches particles or the grid, so the input path and the frame step never
//! contend over simulation state.
//!
//! # Edge-triggered movement
//!
//! `moved_this_frame` is true only for the frame right after a move event:
//!
//! ```text
//! false --(move event)--> true --(one frame processed)--> false
//! ```
//!
//! A pointer that stops moving stops pushing particles, even if some are
//! still underneath it.

use glam::Vec2;
use winit::event::WindowEvent;

/// Canvas-local pointer position plus the edge-triggered move flag.
#[derive(Debug, Clone, Default)]
pub struct Pointer {
    position: Option<Vec2>,
    moved: bool,
    /// Top-left of the canvas in window coordinates.
    origin: Vec2,
}

impl Pointer {
    /// A pointer that has not moved yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known canvas-local position, `None` before the first move.
    #[inline]
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    /// Whether a move arrived since the last frame consumed one.
    #[inline]
    pub fn moved_this_frame(&self) -> bool {
        self.moved
    }

    /// Record a move to a canvas-local position.
    pub fn move_to(&mut self, position: Vec2) {
        self.position = Some(position);
        self.moved = true;
    }

    /// Clear the move flag. Called by the frame step once it has run.
    pub fn consume(&mut self) {
        self.moved = false;
    }

    /// Set where the canvas sits inside the window, so raw cursor
    /// coordinates can be made canvas-local.
    ///
    /// The bundled window is exactly the canvas and leaves this at zero. Hosts
    /// that embed the canvas inside a larger surface set it here.
    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = origin;
    }

    /// Translate a window-space cursor position into canvas space and record it.
    pub fn move_to_window(&mut self, window_position: Vec2) {
        self.move_to(window_position - self.origin);
    }

    /// Process a winit window event.
    ///
    /// Only cursor movement matters. Leaving the window keeps the last
    /// position, so particles near the exit point are not pushed again.
    pub(crate) fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::CursorMoved { position, .. } = event {
            self.move_to_window(Vec2::new(position.x as f32, position.y as f32));
        }
    }
}
