//! error taxonomy shared by the pool, the level loader and the backend seam

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("batch of {count} particles exceeds the recyclable region of {available} slots")]
    BatchTooLarge { count: usize, available: usize },
}

/// Failure reported by the external compute backend.
///
/// Transient failures cost one frame; fatal ones end the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("transient backend failure: {0}")]
    Transient(String),
    #[error("fatal backend failure: {0}")]
    Fatal(String),
}

impl BackendError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, BackendError::Fatal(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("level needs {needed} static particles but only {available} fit before the recycle reserve")]
    TooManyStaticParticles { needed: usize, available: usize },
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
