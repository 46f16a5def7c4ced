//! Change notifications from the grid to an external renderer.
//!
//! The grid never draws anything. Instead every mutation that changes what a
//! renderer would show is recorded here, and the renderer drains the sets once
//! per frame to re-triangulate chunks or update its per-cell data texture.

use std::collections::BTreeSet;

#[derive(Clone, Debug, Default)]
pub struct RefreshTracker {
    dirty_chunks: BTreeSet<usize>,
    terrain_changed: BTreeSet<usize>,
    visibility_changed: BTreeSet<usize>,
    needs_visibility_reset: bool,
}

impl RefreshTracker {
    /// Forget everything pending (used when the map is recreated).
    pub fn reset(&mut self) {
        self.dirty_chunks.clear();
        self.terrain_changed.clear();
        self.visibility_changed.clear();
        self.needs_visibility_reset = false;
    }

    pub(crate) fn mark_chunk(&mut self, chunk: usize) {
        self.dirty_chunks.insert(chunk);
    }

    pub(crate) fn mark_terrain(&mut self, cell: usize) {
        self.terrain_changed.insert(cell);
    }

    pub(crate) fn mark_visibility(&mut self, cell: usize) {
        self.visibility_changed.insert(cell);
    }

    /// A cell's view elevation changed, so line of sight must be recomputed
    /// for every unit on the next tick.
    pub(crate) fn request_visibility_reset(&mut self) {
        self.needs_visibility_reset = true;
    }

    pub(crate) fn take_visibility_reset(&mut self) -> bool {
        std::mem::take(&mut self.needs_visibility_reset)
    }

    pub fn needs_visibility_reset(&self) -> bool {
        self.needs_visibility_reset
    }

    pub fn is_clean(&self) -> bool {
        self.dirty_chunks.is_empty()
            && self.terrain_changed.is_empty()
            && self.visibility_changed.is_empty()
            && !self.needs_visibility_reset
    }

    pub fn dirty_chunks(&self) -> impl Iterator<Item = usize> + '_ {
        self.dirty_chunks.iter().copied()
    }

    /// Chunks whose geometry must be rebuilt, in ascending order.
    pub fn take_dirty_chunks(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.dirty_chunks).into_iter().collect()
    }

    /// Cells whose terrain type changed.
    pub fn take_terrain_changes(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.terrain_changed).into_iter().collect()
    }

    /// Cells that became visible or hidden.
    pub fn take_visibility_changes(&mut self) -> Vec<usize> {
        std::mem::take(&mut self.visibility_changed).into_iter().collect()
    }
}
