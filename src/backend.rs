//! Boundary to the external compute backend.
//!
//! The backend owns the material simulation and rendering. The host pushes
//! buffers, dispatches passes in a fixed order and reads the player record
//! back; nothing else crosses this seam.

use bevy::prelude::*;

use crate::camera::ViewCamera;
use crate::error::BackendError;
use crate::particle::{GridCell, Particle};
use crate::player::{PlayerRecord, TracePoint};

/// compute passes, listed in per‑frame dispatch order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    ClearGrid,
    Scatter,
    Trace,
    PlayerPhysics,
    UpdateParticles,
    Render,
}

/// scalar parameters shared by every pass of a frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    pub particle_count: usize,
    pub grid_size: UVec2,
    pub dt: f32,
    pub gravity: f32,
    /// clamped display camera
    pub camera: ViewCamera,
    pub render_size: UVec2,
}

impl Pass {
    /// work items one dispatch of this pass covers
    pub fn work_items(self, params: &FrameParams, trace_len: usize) -> usize {
        match self {
            Pass::ClearGrid => (params.grid_size.x * params.grid_size.y) as usize,
            Pass::Scatter | Pass::UpdateParticles => params.particle_count,
            Pass::Trace => trace_len,
            Pass::PlayerPhysics => 1,
            Pass::Render => (params.render_size.x * params.render_size.y) as usize,
        }
    }
}

pub trait ComputeBackend: Send + Sync + 'static {
    /// write `particles` into the particle buffer starting at slot `offset`
    fn upload_particles(&mut self, offset: usize, particles: &[Particle]) -> Result<(), BackendError>;

    fn upload_grid(&mut self, cells: &[GridCell]) -> Result<(), BackendError>;

    fn upload_trace(&mut self, points: &[TracePoint]) -> Result<(), BackendError>;

    fn write_player(&mut self, player: &PlayerRecord) -> Result<(), BackendError>;

    fn read_player(&mut self) -> Result<PlayerRecord, BackendError>;

    /// run one pass to completion
    fn dispatch(&mut self, pass: Pass, params: &FrameParams) -> Result<(), BackendError>;
}

/// the backend in use, boxed so the app can pick an implementation at startup
#[derive(Resource)]
pub struct Backend(pub Box<dyn ComputeBackend>);

impl Backend {
    pub fn new(backend: impl ComputeBackend) -> Self {
        Self(Box::new(backend))
    }
}

/* ===========================================================
   MirrorBackend – host‑side copies, no physics
   =========================================================== */

/// Headless backend that keeps copies of everything it is sent and logs
/// the passes it is asked to run. Material physics and rendering are not
/// performed; `ClearGrid` is the only pass with an effect.
#[derive(Default)]
pub struct MirrorBackend {
    pub particles: Vec<Particle>,
    pub grid: Vec<GridCell>,
    pub trace: Vec<TracePoint>,
    pub player: PlayerRecord,
    pub passes: Vec<Pass>,
    /// (offset, len) of every particle upload
    pub uploads: Vec<(usize, usize)>,
    pub bytes_uploaded: usize,
    /// error returned by the next call, for exercising failure paths
    pub fail_next: Option<BackendError>,
}

impl MirrorBackend {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: vec![Particle::EMPTY; capacity],
            ..default()
        }
    }

    fn check(&mut self) -> Result<(), BackendError> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ComputeBackend for MirrorBackend {
    fn upload_particles(&mut self, offset: usize, particles: &[Particle]) -> Result<(), BackendError> {
        self.check()?;
        let end = offset + particles.len();
        if end > self.particles.len() {
            self.particles.resize(end, Particle::EMPTY);
        }
        self.particles[offset..end].copy_from_slice(particles);
        self.uploads.push((offset, particles.len()));
        self.bytes_uploaded += bytemuck::cast_slice::<Particle, u8>(particles).len();
        Ok(())
    }

    fn upload_grid(&mut self, cells: &[GridCell]) -> Result<(), BackendError> {
        self.check()?;
        self.grid.clear();
        self.grid.extend_from_slice(cells);
        self.bytes_uploaded += bytemuck::cast_slice::<GridCell, u8>(cells).len();
        Ok(())
    }

    fn upload_trace(&mut self, points: &[TracePoint]) -> Result<(), BackendError> {
        self.check()?;
        self.trace.clear();
        self.trace.extend_from_slice(points);
        Ok(())
    }

    fn write_player(&mut self, player: &PlayerRecord) -> Result<(), BackendError> {
        self.check()?;
        self.player = *player;
        Ok(())
    }

    fn read_player(&mut self) -> Result<PlayerRecord, BackendError> {
        self.check()?;
        Ok(self.player)
    }

    fn dispatch(&mut self, pass: Pass, params: &FrameParams) -> Result<(), BackendError> {
        self.check()?;
        if pass == Pass::ClearGrid {
            let cells = pass.work_items(params, 0);
            self.grid.clear();
            self.grid.resize(cells, GridCell::default());
        }
        self.passes.push(pass);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FrameParams {
        FrameParams {
            particle_count: 16,
            grid_size: UVec2::new(4, 8),
            dt: 1.0 / 60.0,
            gravity: 8.0,
            camera: ViewCamera::default(),
            render_size: UVec2::new(10, 10),
        }
    }

    #[test]
    fn work_item_counts() {
        let p = params();
        assert_eq!(Pass::ClearGrid.work_items(&p, 64), 32);
        assert_eq!(Pass::Scatter.work_items(&p, 64), 16);
        assert_eq!(Pass::Trace.work_items(&p, 64), 64);
        assert_eq!(Pass::PlayerPhysics.work_items(&p, 64), 1);
        assert_eq!(Pass::Render.work_items(&p, 64), 100);
    }

    #[test]
    fn mirror_copies_uploads_and_fails_once() {
        let mut backend = MirrorBackend::with_capacity(4);
        let mut p = Particle::EMPTY;
        p.id = 2;
        backend.upload_particles(2, &[p]).unwrap();
        assert_eq!(backend.particles[2].id, 2);
        assert_eq!(backend.bytes_uploaded, std::mem::size_of::<Particle>());

        backend.fail_next = Some(BackendError::Transient("busy".into()));
        assert!(backend.dispatch(Pass::Render, &params()).is_err());
        assert!(backend.dispatch(Pass::ClearGrid, &params()).is_ok());
        assert_eq!(backend.passes, vec![Pass::ClearGrid]);
        assert_eq!(backend.grid.len(), 32);
    }
}
