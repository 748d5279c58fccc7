use perturbrust_core::{CoreError, FamilyId};
use thiserror::Error;

/// Errors originating from the deep-zoom engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("perturbation engine not initialized (call initialize_perturbation first)")]
    NotInitialized,

    #[error("family {family:?} does not support {capability}")]
    Unsupported {
        family: FamilyId,
        capability: &'static str,
    },

    #[error("computation cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] CoreError),
}
