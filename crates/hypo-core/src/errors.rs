//! Errores del core.
//!
//! Dos canales separados: los fallos "soft" de un stage se registran como
//! valor en `StageResult` (ver `StageError`), mientras que los fallos "hard"
//! (manifest, ledger, validación de artifacts, cancelación) se propagan como
//! `PipelineError` y detienen la corrida.

use thiserror::Error;

use crate::ids::RunId;
use crate::model::ArtifactKind;
use crate::stage::StageKind;

/// Campo obligatorio ausente o inválido.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("validation failed for {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { field: field.into(),
               reason: reason.into() }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown artifact kind: {0}")]
    UnknownArtifactKind(ArtifactKind),
    #[error("artifact {artifact_id} ({kind}) failed validation: {reason}")]
    ArtifactValidation { artifact_id: String, kind: ArtifactKind, reason: String },
}

/// Errores del puerto de ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("run manifest not stored for run {0}")]
    ManifestMissing(RunId),
    #[error("run manifest already stored for run {0}")]
    ManifestAlreadyStored(RunId),
    #[error("manifest for run {manifest_run} stored under run {run_id}")]
    RunMismatch { run_id: RunId, manifest_run: RunId },
    #[error("duplicate artifact id: {0}")]
    DuplicateArtifact(String),
    #[error("ledger backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RngError {
    #[error("rng stream unavailable for {name}: {reason}")]
    Unavailable { name: String, reason: String },
}

/// Error interno de un stage. Nunca aborta la corrida: el orquestador lo
/// convierte en `StageResult { success: false, .. }`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("unsupported stage kind: {0}")]
    UnsupportedKind(StageKind),
    #[error("unknown stage: {0}")]
    UnknownStage(String),
    #[error("invalid stage config: {0}")]
    InvalidConfig(String),
    #[error("stage execution failed: {0}")]
    Execution(String),
    #[error("stage cancelled")]
    Cancelled,
}

/// Fallos fatales de `Orchestrator::execute_pipeline`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid run manifest: {0}")]
    InvalidManifest(#[source] ValidationError),
    #[error("invalid stage plan: {0}")]
    InvalidPlan(#[source] ValidationError),
    #[error("{context}: {source}")]
    LedgerWrite {
        context: String,
        #[source]
        source: LedgerError,
    },
    #[error("artifact validation failed for {artifact_id}: {source}")]
    ArtifactValidation {
        artifact_id: String,
        #[source]
        source: RegistryError,
    },
    #[error("attempted to store stage artifact before run manifest for run {0}")]
    ManifestNotStored(RunId),
    #[error("pipeline cancelled for run {run_id} after {completed_stages} stages")]
    Cancelled { run_id: RunId, completed_stages: usize },
}

impl PipelineError {
    /// `true` para errores originados en el ledger (útil para reintentos del caller).
    pub fn is_ledger_error(&self) -> bool {
        matches!(self, PipelineError::LedgerWrite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_format() {
        let e = ValidationError::new("run_manifest", "run_id cannot be empty");
        assert_eq!(e.to_string(), "validation failed for run_manifest: run_id cannot be empty");
    }

    #[test]
    fn ledger_write_wraps_source() {
        let e = PipelineError::LedgerWrite { context: "failed to store run manifest".into(),
                                             source: LedgerError::Backend("disk full".into()) };
        assert_eq!(e.to_string(), "failed to store run manifest: ledger backend error: disk full");
        assert!(e.is_ledger_error());
    }
}
