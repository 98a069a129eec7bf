//! Host side of the Caves of Titan particle sandbox.
//!
//! The crate generates levels (a maze carved on a coarse lattice, smoothed
//! into a cave on a fine one), owns the particle pool the compute backend
//! simulates, and steers the camera. The material physics and the renderer
//! live behind [`backend::ComputeBackend`].
//!
//! - [`maze`]: recursive‑backtracking maze with a minimum walk length
//! - [`cave`]: maze‑biased random fill, cellular smoothing, oil pockets
//! - [`pool`]: fixed‑capacity ring of particles above a locked static floor
//! - [`camera`]: world/screen mapping and edge clamping
//! - [`level`] / [`driver`]: level loading and the per‑frame pass order

pub mod backend;
pub mod camera;
pub mod cave;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod level;
pub mod maze;
pub mod particle;
pub mod player;
pub mod pool;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::backend::{Backend, ComputeBackend, FrameParams, MirrorBackend, Pass};
    pub use crate::camera::{DisplayCamera, ViewCamera, Viewport};
    pub use crate::config::LevelConfig;
    pub use crate::driver::{run_frame, SimClock, SimulationPlugin};
    pub use crate::error::{BackendError, LevelError, PoolError};
    pub use crate::level::{init_level, Level, LevelSeed};
    pub use crate::particle::{GridCell, Material, Particle};
    pub use crate::pool::ParticlePool;
}
