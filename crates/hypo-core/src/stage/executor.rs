//! Contrato entre el orquestador y las implementaciones de stages.
//!
//! Cada stage consume `(MatrixBundle, StageSpec)` dentro de un
//! `StageContext` y produce artifacts sin persistirlos: la escritura al
//! ledger es responsabilidad exclusiva del orquestador.

use crate::dataset::MatrixBundle;
use crate::engine::CancellationFlag;
use crate::errors::StageError;
use crate::ids::RunId;
use crate::model::Artifact;
use crate::run::RunManifest;
use crate::stage::plan::{StageKind, StageSpec};
use crate::stage::result::StageMetrics;

/// Contexto de ejecución de un stage.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub run_id: &'a RunId,
    pub manifest: &'a RunManifest,
    pub bundle: &'a MatrixBundle,
    pub spec: &'a StageSpec,
    pub cancel: &'a CancellationFlag,
}

impl StageContext<'_> {
    /// Seed base de la corrida (la del manifest).
    pub fn seed(&self) -> i64 {
        self.manifest.seed
    }

    pub fn stage_name(&self) -> &str {
        &self.spec.name
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Salida de un stage exitoso.
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    pub artifacts: Vec<Artifact>,
    pub metrics: StageMetrics,
    pub warnings: Vec<String>,
}

impl StageOutput {
    pub fn new(artifacts: Vec<Artifact>, metrics: StageMetrics) -> Self {
        Self { artifacts,
               metrics,
               warnings: Vec::new() }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Implementación de los stages de un `StageKind`.
///
/// Debe ser determinista respecto a bundle + spec + seed del manifest.
pub trait StageExecutor: Send + Sync {
    fn kind(&self) -> StageKind;

    fn execute(&self, ctx: &StageContext<'_>) -> Result<StageOutput, StageError>;
}
