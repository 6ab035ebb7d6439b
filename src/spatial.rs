//! Uniform spatial grid for pointer neighbor queries.
//!
//! The canvas is cut into square cells whose side equals the interaction
//! radius. Any particle within that radius of a point is then guaranteed to
//! sit in the 3x3 block of cells around the point's own cell, so a pointer
//! query touches nine small sets instead of every particle.
//!
//! Cells hold particle indices into the owning [`ParticleField`]; particles
//! cache the cell they belong to. [`SpatialGrid::relocate`] keeps the two in
//! agreement after a particle moves.
//!
//! [`ParticleField`]: crate::field::ParticleField

use std::collections::HashSet;

use glam::Vec2;

use crate::particle::Particle;

/// Index of a particle inside its field.
pub type ParticleId = usize;

/// Row/column of an in-bounds grid cell.
///
/// Off-grid membership is expressed as `Option<GridCell>::None` wherever a
/// cell is cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

impl GridCell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Offsets of the 3x3 block around a cell, as `(row, col)`.
#[rustfmt::skip]
const NEIGHBOR_OFFSETS: [(i64, i64); 9] = [
    (-1, -1), (-1, 0), (-1, 1),
    ( 0, -1), ( 0, 0), ( 0, 1),
    ( 1, -1), ( 1, 0), ( 1, 1),
];

/// Uniform grid over the canvas, mapping cells to the particles inside them.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    rows: usize,
    cols: usize,
    cells: Vec<HashSet<ParticleId>>,
}

impl SpatialGrid {
    /// Create an empty grid covering a `width` x `height` canvas.
    ///
    /// `rows = ceil(height / cell_size)` and `cols = ceil(width / cell_size)`.
    /// A non-positive or non-finite cell size yields a grid with no cells, in
    /// which every particle is off-grid.
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let (rows, cols) = if cell_size.is_finite() && cell_size > 0.0 {
            (cells_along(height, cell_size), cells_along(width, cell_size))
        } else {
            (0, 0)
        };

        Self {
            cell_size,
            rows,
            cols,
            cells: vec![HashSet::new(); rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Raw cell coordinates of a position, which may lie outside the grid.
    ///
    /// Returned as `(row, col)`.
    pub fn signed_cell(&self, position: Vec2) -> (i64, i64) {
        if self.rows == 0 || self.cols == 0 {
            return (-1, -1);
        }
        (
            (position.y / self.cell_size).floor() as i64,
            (position.x / self.cell_size).floor() as i64,
        )
    }

    /// Bounds-checked conversion from raw coordinates to a cell.
    pub fn cell_at(&self, row: i64, col: i64) -> Option<GridCell> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        (row < self.rows && col < self.cols).then(|| GridCell::new(row, col))
    }

    /// The cell containing `position`, or `None` when it is off-grid.
    pub fn cell_of(&self, position: Vec2) -> Option<GridCell> {
        let (row, col) = self.signed_cell(position);
        self.cell_at(row, col)
    }

    /// Add a particle to a cell.
    ///
    /// Cells are sets, so inserting twice leaves a single membership.
    pub fn insert(&mut self, id: ParticleId, cell: GridCell) {
        debug_assert!(cell.row < self.rows && cell.col < self.cols);
        if let Some(index) = self.index(cell) {
            self.cells[index].insert(id);
        }
    }

    /// Remove a particle from a cell if present.
    ///
    /// `None` (off-grid) is a no-op. Returns whether a membership was removed.
    pub fn remove(&mut self, id: ParticleId, cell: Option<GridCell>) -> bool {
        match cell.and_then(|c| self.index(c)) {
            Some(index) => self.cells[index].remove(&id),
            None => false,
        }
    }

    /// Bring the grid in line with a particle's current position.
    ///
    /// Moves the particle between cells, drops it from the grid when it leaves
    /// the canvas, and re-adds it when it comes back. The particle's cached
    /// cell is updated to match. Returns whether membership changed.
    pub fn relocate(&mut self, id: ParticleId, particle: &mut Particle) -> bool {
        let target = self.cell_of(particle.position);
        if target == particle.cell {
            return false;
        }

        self.remove(id, particle.cell);
        if let Some(cell) = target {
            self.insert(id, cell);
        }
        particle.cell = target;
        true
    }

    /// Particles in the 3x3 block of cells centered on `(row, col)`.
    ///
    /// The center may itself be off-grid (a pointer just outside the canvas
    /// still reaches the edge cells); offsets outside the grid are skipped.
    /// The result is a snapshot, safe to hold while particles are relocated.
    pub fn neighbors(&self, row: i64, col: i64) -> Vec<ParticleId> {
        let mut found = Vec::new();
        for (dr, dc) in NEIGHBOR_OFFSETS {
            let cell = self.cell_at(row.saturating_add(dr), col.saturating_add(dc));
            if let Some(index) = cell.and_then(|c| self.index(c)) {
                found.extend(self.cells[index].iter().copied());
            }
        }
        found
    }

    /// Particles in the 3x3 block around the cell containing `position`.
    pub fn neighbors_of(&self, position: Vec2) -> Vec<ParticleId> {
        let (row, col) = self.signed_cell(position);
        self.neighbors(row, col)
    }

    pub fn contains(&self, id: ParticleId, cell: GridCell) -> bool {
        self.index(cell)
            .map(|index| self.cells[index].contains(&id))
            .unwrap_or(false)
    }

    /// Number of particles in one cell.
    pub fn cell_len(&self, cell: GridCell) -> usize {
        self.index(cell).map(|index| self.cells[index].len()).unwrap_or(0)
    }

    /// Total memberships across all cells.
    pub fn member_count(&self) -> usize {
        self.cells.iter().map(HashSet::len).sum()
    }

    /// Drop every membership, keeping dimensions.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    fn index(&self, cell: GridCell) -> Option<usize> {
        (cell.row < self.rows && cell.col < self.cols).then(|| cell.row * self.cols + cell.col)
    }
}

fn cells_along(extent: f32, cell_size: f32) -> usize {
    if extent.is_finite() && extent > 0.0 {
        (extent / cell_size).ceil() as usize
    } else {
        0
    }
}
