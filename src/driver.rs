//! per‑frame orchestration and the Bevy plugin that wires it all up

use bevy::prelude::*;

use crate::backend::{Backend, ComputeBackend, FrameParams, MirrorBackend, Pass};
use crate::camera::{
    camera_clamp_system, camera_follow_system, viewport_track_system, DisplayCamera, ViewCamera,
    Viewport,
};
use crate::config::LevelConfig;
use crate::constants::*;
use crate::error::BackendError;
use crate::level::{
    hazard_emit_system, load_level_system, reload_input_system, Level, LevelSeed,
};
use crate::player::{
    exhaust_emit_system, player_input_system, trace_aim_system, PlayerRecord, PlayerState,
    TraceState,
};
use crate::pool::ParticlePool;

/// simulation time, separate from wall‑clock so a reload restarts it
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct SimClock {
    pub time: f64,
    /// step with this instead of the frame delta (headless / replays)
    pub fixed_dt: Option<f32>,
}

impl SimClock {
    /// advance by one frame; large stalls are capped at `MAX_DT`
    pub fn step(&mut self, frame_delta: f32) -> f32 {
        let dt = self.fixed_dt.unwrap_or(frame_delta).clamp(0.0, MAX_DT);
        self.time += dt as f64;
        dt
    }
}

pub fn frame_params(
    config: &LevelConfig,
    pool: &ParticlePool,
    camera: ViewCamera,
    render_size: UVec2,
    dt: f32,
) -> FrameParams {
    FrameParams {
        particle_count: pool.capacity(),
        grid_size: config.world_size,
        dt,
        gravity: GRAVITY,
        camera,
        render_size,
    }
}

/// One backend frame in the fixed order: pending pool writes, trace and
/// player records, then the passes. The player record is read back right
/// after its physics pass so the rest of the frame sees where it ended up.
///
/// Any error stops the frame where it happened; dirty pool ranges that did
/// not make it across are retried next frame.
pub fn run_frame(
    backend: &mut dyn ComputeBackend,
    pool: &mut ParticlePool,
    trace: &TraceState,
    player: &mut PlayerRecord,
    params: &FrameParams,
) -> Result<(), BackendError> {
    pool.flush(|offset, slice| backend.upload_particles(offset, slice))?;
    if trace.active {
        backend.upload_trace(&trace.points)?;
    }
    backend.write_player(player)?;

    backend.dispatch(Pass::ClearGrid, params)?;
    backend.dispatch(Pass::Scatter, params)?;
    if trace.active {
        backend.dispatch(Pass::Trace, params)?;
    }
    backend.dispatch(Pass::PlayerPhysics, params)?;
    *player = backend.read_player()?;
    backend.dispatch(Pass::UpdateParticles, params)?;
    backend.dispatch(Pass::Render, params)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn simulation_frame_system(
    time: Res<Time>,
    config: Res<LevelConfig>,
    display: Res<DisplayCamera>,
    viewport: Res<Viewport>,
    trace: Res<TraceState>,
    level: Option<Res<Level>>,
    mut clock: ResMut<SimClock>,
    mut pool: ResMut<ParticlePool>,
    mut backend: ResMut<Backend>,
    mut player: ResMut<PlayerState>,
    mut exit: EventWriter<AppExit>,
) {
    if level.is_none() {
        return;
    }
    let dt = clock.step(time.delta_secs());
    let params = frame_params(&config, &pool, display.0, viewport.0, dt);

    match run_frame(backend.0.as_mut(), &mut pool, &trace, &mut player.record, &params) {
        Ok(()) => {}
        Err(err) if err.is_fatal() => {
            error!("backend failed at t={:.2}s: {err}", clock.time);
            exit.send(AppExit::error());
        }
        Err(err) => warn!("frame dropped: {err}"),
    }
}

/* ===========================================================
   plugin
   =========================================================== */

/// Inserts the simulation resources and systems.
///
/// `LevelConfig`, `LevelSeed` and `Backend` inserted before this plugin
/// are kept; otherwise the defaults, a random seed and a [`MirrorBackend`]
/// are used.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelConfig>();
        let capacity = app.world().resource::<LevelConfig>().capacity;

        app.insert_resource(ParticlePool::new(capacity))
            .init_resource::<ViewCamera>()
            .init_resource::<DisplayCamera>()
            .init_resource::<Viewport>()
            .init_resource::<PlayerState>()
            .init_resource::<TraceState>()
            .init_resource::<SimClock>();

        if !app.world().contains_resource::<Backend>() {
            app.insert_resource(Backend::new(MirrorBackend::with_capacity(capacity.get())));
        }
        if !app.world().contains_resource::<LevelSeed>() {
            app.insert_resource(LevelSeed::random());
        }

        app.add_systems(
            Update,
            (
                reload_input_system,
                load_level_system.run_if(resource_changed::<LevelSeed>),
                player_input_system,
                trace_aim_system,
                exhaust_emit_system,
                hazard_emit_system,
            )
                .chain(),
        )
        .add_systems(
            PostUpdate,
            (
                viewport_track_system,
                camera_follow_system,
                camera_clamp_system,
                simulation_frame_system,
            )
                .chain(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::{Material, Particle};
    use std::num::NonZeroUsize;

    fn setup() -> (MirrorBackend, ParticlePool, FrameParams) {
        let mut pool = ParticlePool::new(NonZeroUsize::new(16).unwrap());
        pool.insert_many(&mut vec![Particle::default(); 4]).unwrap();
        pool.lock_floor();
        let config = LevelConfig::default().with_world_size(UVec2::new(8, 8));
        let params = frame_params(&config, &pool, ViewCamera::default(), UVec2::new(4, 4), DEFAULT_DT);
        (MirrorBackend::with_capacity(16), pool, params)
    }

    #[test]
    fn clock_caps_long_frames() {
        let mut clock = SimClock::default();
        assert_eq!(clock.step(0.5), MAX_DT);
        assert_eq!(clock.step(-1.0), 0.0);
        clock.fixed_dt = Some(0.01);
        assert_eq!(clock.step(0.5), 0.01);
        assert!((clock.time - (MAX_DT as f64 + 0.01)).abs() < 1e-6);
    }

    #[test]
    fn passes_run_in_order() {
        let (mut backend, mut pool, params) = setup();
        let mut record = PlayerRecord::at(Vec2::new(3.0, 4.0));
        let idle = TraceState::default();
        run_frame(&mut backend, &mut pool, &idle, &mut record, &params).unwrap();
        assert_eq!(
            backend.passes,
            vec![
                Pass::ClearGrid,
                Pass::Scatter,
                Pass::PlayerPhysics,
                Pass::UpdateParticles,
                Pass::Render,
            ]
        );
        assert!(backend.trace.is_empty());

        backend.passes.clear();
        let mut aiming = TraceState::default();
        aiming.aim(Vec2::ZERO, Vec2::ONE);
        run_frame(&mut backend, &mut pool, &aiming, &mut record, &params).unwrap();
        assert_eq!(backend.passes[2], Pass::Trace);
        assert_eq!(backend.trace.len(), TRACE_LEN);
        assert_eq!(record.position(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn pool_writes_reach_the_backend_once() {
        let (mut backend, mut pool, params) = setup();
        let mut record = PlayerRecord::default();
        let trace = TraceState::default();
        run_frame(&mut backend, &mut pool, &trace, &mut record, &params).unwrap();
        assert_eq!(backend.uploads, vec![(0, 16)]);

        pool.insert_one(Particle::new(Material::Fire, Vec2::ONE, 1.0, 1.0));
        run_frame(&mut backend, &mut pool, &trace, &mut record, &params).unwrap();
        run_frame(&mut backend, &mut pool, &trace, &mut record, &params).unwrap();
        assert_eq!(backend.uploads, vec![(0, 16), (4, 1)]);
        assert_eq!(backend.particles[4].id, 4);
    }

    #[test]
    fn failed_frame_retries_uploads() {
        let (mut backend, mut pool, params) = setup();
        let mut record = PlayerRecord::default();
        let trace = TraceState::default();
        backend.fail_next = Some(BackendError::Transient("queue full".into()));

        let err = run_frame(&mut backend, &mut pool, &trace, &mut record, &params).unwrap_err();
        assert!(!err.is_fatal());
        assert!(backend.passes.is_empty());
        assert_eq!(pool.dirty().to_vec(), vec![0..16]);

        run_frame(&mut backend, &mut pool, &trace, &mut record, &params).unwrap();
        assert!(pool.dirty().is_empty());
        assert_eq!(backend.passes.len(), 5);
    }
}
