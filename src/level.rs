//! level loading: maze → cave → static particle set → backend
//!
//! Everything procedural is driven by one `StdRng` seeded from
//! [`LevelSeed`], so a seed always rebuilds the same cave.

use bevy::input::ButtonInput;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backend::{Backend, ComputeBackend, FrameParams, Pass};
use crate::camera::{DisplayCamera, ViewCamera, Viewport};
use crate::cave::{generate_cave, CaveGrid};
use crate::config::LevelConfig;
use crate::constants::*;
use crate::driver::{frame_params, SimClock};
use crate::error::{BackendError, LevelError};
use crate::maze::Maze;
use crate::particle::{GridCell, Material, Particle};
use crate::player::{PlayerRecord, PlayerState, TraceState};
use crate::pool::ParticlePool;

/// seed of the level currently loaded; changing it reloads the level
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelSeed(pub u64);

impl LevelSeed {
    pub fn random() -> Self {
        Self(rand::random())
    }
}

#[derive(Resource, Debug)]
pub struct Level {
    pub seed: u64,
    /// far end of the maze walk, in maze cells
    pub maze_end: IVec2,
    /// ember sources in world units
    pub hazards: Vec<Vec2>,
    pub hazard_timer: Timer,
    pub player_start: Vec2,
    /// size of the locked static region
    pub static_count: usize,
    /// relaxation passes the cave needed
    pub passes: usize,
}

/* ===========================================================
   load
   =========================================================== */

/// Build the level for `seed` and push it to the backend.
///
/// The pool is cleared, filled with the static set and its floor locked;
/// the backend receives the whole particle buffer, a zeroed grid and the
/// player placed in the maze's start room.
pub fn init_level(
    config: &LevelConfig,
    seed: u64,
    pool: &mut ParticlePool,
    backend: &mut dyn ComputeBackend,
) -> Result<Level, LevelError> {
    let mut rng = StdRng::seed_from_u64(seed);
    pool.clear();

    let maze = Maze::generate(config.maze_size, config.maze_start, config.maze_budget, &mut rng);
    if !maze.complete() {
        warn!(
            "maze walk stopped at {} of {} moves; cave follows the partial walk",
            maze.path_len(),
            Maze::required_len(maze.size())
        );
    }

    let cave = generate_cave(config, &maze, &mut rng);
    let mut statics = cave.particles(config, &mut rng);

    // at least one slot stays recyclable so the floor never meets the capacity
    let available = pool
        .capacity()
        .saturating_sub(config.recycle_reserve.max(1));
    if statics.len() > available {
        return Err(LevelError::TooManyStaticParticles {
            needed: statics.len(),
            available,
        });
    }
    pool.insert_many(&mut statics)?;
    pool.lock_floor();

    pool.flush(|offset, slice| backend.upload_particles(offset, slice))?;
    let cells = (config.world_size.x * config.world_size.y) as usize;
    backend.upload_grid(&vec![GridCell::default(); cells])?;

    let player_start = spawn_point(config, &maze, &cave.grid);
    backend.write_player(&PlayerRecord::at(player_start))?;

    info!(
        "level {seed:#x}: maze {} moves, cave {} passes, {} static particles, {} hazards",
        maze.path_len(),
        cave.passes,
        pool.floor(),
        cave.hazards.len()
    );

    Ok(Level {
        seed,
        maze_end: maze.end(),
        hazards: cave.hazards,
        hazard_timer: Timer::from_seconds(HAZARD_INTERVAL, TimerMode::Repeating),
        player_start,
        static_count: pool.floor(),
        passes: cave.passes,
    })
}

/// Nearest open fine cell to the centre of the maze start room, searched
/// in growing square rings.
pub fn spawn_point(config: &LevelConfig, maze: &Maze, grid: &CaveGrid) -> Vec2 {
    let size = grid.size() as i32;
    let cell = config.cell_extent();
    let room = (maze.start().as_vec2() + 0.5) * size as f32 / maze.size().max(1) as f32;
    let centre = room.floor().as_ivec2();

    for r in 0..size {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx.abs() != r && dy.abs() != r {
                    continue;
                }
                let p = centre + IVec2::new(dx, dy);
                if !grid.solid(p.x, p.y) {
                    return (p.as_vec2() + 0.5) * cell;
                }
            }
        }
    }
    (centre.as_vec2() + 0.5) * cell
}

/// Let the freshly seeded material settle before the first shown frame.
pub fn fast_forward(
    backend: &mut dyn ComputeBackend,
    params: &FrameParams,
    frames: u32,
) -> Result<(), BackendError> {
    for _ in 0..frames {
        backend.dispatch(Pass::ClearGrid, params)?;
        backend.dispatch(Pass::Scatter, params)?;
        backend.dispatch(Pass::UpdateParticles, params)?;
    }
    Ok(())
}

/// One ember per hazard point, batched into the recyclable region.
/// Points beyond what the ring can hold are skipped this round.
pub fn emit_embers(hazards: &[Vec2], pool: &mut ParticlePool) -> usize {
    let mut batch: Vec<Particle> = hazards
        .iter()
        .take(pool.recyclable())
        .map(|&p| {
            Particle::new(Material::Fire, p, EMBER_RADIUS, EMBER_MASS).with_heat(EMBER_HEAT)
        })
        .collect();
    match pool.insert_many(&mut batch) {
        Ok(span) => span.len(),
        Err(err) => {
            warn!("embers dropped: {err}");
            0
        }
    }
}

/* ===========================================================
   systems
   =========================================================== */

/// (re)load whenever `LevelSeed` changes, including its first insertion
#[allow(clippy::too_many_arguments)]
pub fn load_level_system(
    mut commands: Commands,
    seed: Res<LevelSeed>,
    config: Res<LevelConfig>,
    viewport: Res<Viewport>,
    mut pool: ResMut<ParticlePool>,
    mut backend: ResMut<Backend>,
    mut player: ResMut<PlayerState>,
    mut trace: ResMut<TraceState>,
    mut camera: ResMut<ViewCamera>,
    mut display: ResMut<DisplayCamera>,
    mut clock: ResMut<SimClock>,
    mut exit: EventWriter<AppExit>,
) {
    if pool.capacity() != config.capacity.get() {
        *pool = ParticlePool::new(config.capacity);
    }

    let level = match init_level(&config, seed.0, &mut pool, backend.0.as_mut()) {
        Ok(level) => level,
        Err(err) => {
            error!("level {:#x} failed to load: {err}", seed.0);
            exit.send(AppExit::error());
            return;
        }
    };

    *player = PlayerState {
        record: PlayerRecord::at(level.player_start),
        jetpack: false,
    };
    trace.active = false;
    camera.center = level.player_start;
    display.0 = camera.clamp(viewport.0.as_vec2(), config.world_size.as_vec2());
    clock.time = 0.0;

    let params = frame_params(&config, &pool, display.0, viewport.0, DEFAULT_DT);
    if let Err(err) = fast_forward(backend.0.as_mut(), &params, config.fast_forward_frames) {
        if err.is_fatal() {
            error!("fast-forward failed: {err}");
            exit.send(AppExit::error());
            return;
        }
        warn!("fast-forward cut short: {err}");
    }

    commands.insert_resource(level);
}

/// R → new random seed
pub fn reload_input_system(keys: Res<ButtonInput<KeyCode>>, mut seed: ResMut<LevelSeed>) {
    if keys.just_pressed(KeyCode::KeyR) {
        *seed = LevelSeed::random();
        info!("reloading with seed {:#x}", seed.0);
    }
}

pub fn hazard_emit_system(
    time: Res<Time>,
    level: Option<ResMut<Level>>,
    mut pool: ResMut<ParticlePool>,
) {
    let Some(mut level) = level else { return };
    level.hazard_timer.tick(time.delta());
    if level.hazard_timer.just_finished() {
        emit_embers(&level.hazards, &mut pool);
    }
}
