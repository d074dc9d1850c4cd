//! Errores de la aplicación: envuelven los fallos fatales del core.
use thiserror::Error;

use hypo_core::{LedgerError, PipelineError, ValidationError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Datos inválidos: {0}")]
    Data(#[from] ValidationError),
    #[error("Pipeline abortado: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Error de ledger: {0}")]
    Ledger(#[from] LedgerError),
}
