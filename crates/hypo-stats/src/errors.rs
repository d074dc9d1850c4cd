//! Errores del referee y de los stages estadísticos.

use thiserror::Error;

use hypo_core::{RngError, StageError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefereeError {
    #[error("permutation test cancelled after {completed} shuffles")]
    Cancelled { completed: usize },
    #[error(transparent)]
    Rng(#[from] RngError),
    #[error("invalid referee config: {0}")]
    InvalidConfig(String),
}

impl From<RefereeError> for StageError {
    fn from(e: RefereeError) -> Self {
        match e {
            RefereeError::Cancelled { .. } => StageError::Cancelled,
            RefereeError::InvalidConfig(msg) => StageError::InvalidConfig(msg),
            other => StageError::Execution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_maps_to_stage_cancelled() {
        let e: StageError = RefereeError::Cancelled { completed: 200 }.into();
        assert_eq!(e, StageError::Cancelled);
    }

    #[test]
    fn rng_error_is_transparent() {
        let e = RefereeError::from(RngError::Unavailable { name: "x:y".into(),
                                                           reason: "closed".into() });
        assert_eq!(e.to_string(), "rng stream unavailable for x:y: closed");
    }
}
