//! Level-generation parameters.
//!
//! Defaults come from `constants.rs`; the resource can be replaced before
//! startup (or between reloads) to generate a different kind of cave.

use bevy::prelude::*;
use std::num::NonZeroUsize;

use crate::constants::*;

#[derive(Resource, Clone, Debug)]
pub struct LevelConfig {
    /// coarse maze lattice edge (rooms sit on even coordinates)
    pub maze_size: usize,
    /// room the maze walk starts from; the player spawns here
    pub maze_start: IVec2,
    /// upper bound on maze search visits before settling for the best walk
    pub maze_budget: usize,

    /// fine occupancy lattice edge
    pub cave_size: usize,
    /// cells within this margin of an edge are forced rock
    pub border: usize,
    /// rock probability inside open maze cells
    pub open_fill: f32,
    /// rock probability inside closed maze cells
    pub closed_fill: f32,
    /// maximum relaxation passes (stops early at a fixed point)
    pub smoothing_passes: usize,
    /// chance for an open cell to become a hazard seed
    pub hazard_chance: f32,

    pub oil_noise_threshold: f64,
    pub oil_per_cell: usize,
    pub rock_mass_variation: f32,

    /// world extent the fine grid is scaled into
    pub world_size: UVec2,
    /// particle pool capacity
    pub capacity: NonZeroUsize,
    /// slots that must remain recyclable after static seeding
    pub recycle_reserve: usize,
    /// frames pre-simulated before the level is shown
    pub fast_forward_frames: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            maze_size: MAZE_SIZE,
            maze_start: MAZE_START,
            maze_budget: MAZE_SEARCH_BUDGET,
            cave_size: CAVE_SIZE,
            border: CAVE_BORDER,
            open_fill: OPEN_FILL,
            closed_fill: CLOSED_FILL,
            smoothing_passes: SMOOTHING_PASSES,
            hazard_chance: HAZARD_CHANCE,
            oil_noise_threshold: OIL_NOISE_THRESHOLD,
            oil_per_cell: OIL_PER_CELL,
            rock_mass_variation: ROCK_MASS_VARIATION,
            world_size: GRID_SIZE,
            capacity: NonZeroUsize::new(NUM_PARTICLES).unwrap_or(NonZeroUsize::MIN),
            recycle_reserve: RECYCLE_RESERVE,
            fast_forward_frames: FAST_FORWARD_FRAMES,
        }
    }
}

impl LevelConfig {
    pub fn with_maze_size(mut self, size: usize) -> Self {
        self.maze_size = size;
        self
    }

    pub fn with_cave_size(mut self, size: usize) -> Self {
        self.cave_size = size;
        self
    }

    pub fn with_world_size(mut self, size: UVec2) -> Self {
        self.world_size = size;
        self
    }

    pub fn with_capacity(mut self, capacity: NonZeroUsize, reserve: usize) -> Self {
        self.capacity = capacity;
        self.recycle_reserve = reserve;
        self
    }

    pub fn with_smoothing_passes(mut self, passes: usize) -> Self {
        self.smoothing_passes = passes;
        self
    }

    pub fn with_hazard_chance(mut self, chance: f32) -> Self {
        self.hazard_chance = chance;
        self
    }

    pub fn with_fast_forward(mut self, frames: u32) -> Self {
        self.fast_forward_frames = frames;
        self
    }

    /// world units covered by one fine cell
    pub fn cell_extent(&self) -> Vec2 {
        self.world_size.as_vec2() / self.cave_size as f32
    }
}
