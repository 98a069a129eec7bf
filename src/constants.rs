use bevy::prelude::*;
use std::ops::Range;

/// -------- backend buffers --------
pub const NUM_PARTICLES: usize = 512 * 512;
pub const GRID_SIZE: UVec2     = UVec2::new(2048, 2048);
pub const GRAVITY: f32         = 8.0;
pub const TRACE_LEN: usize     = 64;

/// -------- window --------
pub const WINDOW_SIZE: UVec2 = UVec2::new(1024, 1024);
pub const DEFAULT_ZOOM: f32  = 1.0;

/// -------- maze (coarse lattice) --------
pub const MAZE_SIZE: usize          = 12;
pub const MAZE_START: IVec2         = IVec2::new(0, 0);
pub const MAZE_SEARCH_BUDGET: usize = 200_000;

/// -------- cave (fine lattice) --------
pub const CAVE_SIZE: usize        = 512;
pub const CAVE_BORDER: usize      = 5;
pub const OPEN_FILL: f32          = 0.32;
pub const CLOSED_FILL: f32        = 0.55;
pub const SMOOTHING_PASSES: usize = 40;
pub const HAZARD_CHANCE: f32      = 0.0005;

/// a Moore count of exactly this keeps the previous state
pub const KEEP_COUNT: u32 = 5;

/// -------- oil pockets --------
pub const OIL_BELOW_THRESHOLD: u32 = 2;
pub const OIL_NOISE_SCALE: f64     = 0.03;
pub const OIL_NOISE_THRESHOLD: f64 = 0.25;
pub const OIL_PER_CELL: usize      = 8;
pub const OIL_MASS: f32            = 12.5;

/// -------- rock strata --------
pub const ROCK_MASS: f32               = 100.0;
pub const STRATA_NOISE_SCALE: f64      = 0.02;
pub const STRATA_LEVELS: i32           = 4;
pub const ROCK_MASS_VARIATION: f32     = 0.2;

/// recyclable slots that must stay free after static seeding
pub const RECYCLE_RESERVE: usize = 16 * 1024;

/// -------- timing --------
pub const DEFAULT_DT: f32         = 1.0 / 60.0;
pub const MAX_DT: f32             = 1.0 / 30.0;
pub const FAST_FORWARD_FRAMES: u32 = 120;

/// -------- player --------
pub const PLAYER_RADIUS: f32 = 6.0;
pub const WALK_SPEED: f32    = 200.0;
pub const JUMP_SPEED: f32    = 250.0;

/// -------- jet‑pack exhaust --------
pub const EXHAUST_RATE: usize           = 8;
pub const EXHAUST_RADIUS: f32           = 1.5;
pub const EXHAUST_MASS: f32             = 1.0;
pub const EXHAUST_HEAT: f32             = 600.0;
pub const EXHAUST_SPEED_Y: Range<f32>   = 120.0..300.0;
pub const EXHAUST_SPEED_X: Range<f32>   = -50.0..50.0;

/// -------- hazards --------
pub const HAZARD_INTERVAL: f32 = 0.25;
pub const EMBER_RADIUS: f32    = 2.0;
pub const EMBER_MASS: f32      = 2.0;
pub const EMBER_HEAT: f32      = 900.0;
