//! hypo-core: ledger de artifacts, manifest de corrida y orquestador de stages.
//!
//! El core es neutral respecto a los análisis concretos: conoce el modelo de
//! artifacts (unión cerrada por kind), el registry que los valida, el
//! `RunManifest` con su fingerprint determinista y el `Orchestrator` que
//! ejecuta un `StagePlan` delegando en `StageExecutor`s registrados. Las
//! implementaciones estadísticas viven en `hypo-stats`.
pub mod constants;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod hashing;
pub mod ids;
pub mod ledger;
pub mod model;
pub mod registry;
pub mod rng;
pub mod run;
pub mod stage;

pub use dataset::{ColumnMeta, Matrix, MatrixBundle, StatisticalType};
pub use engine::{CancellationFlag, Orchestrator, OrchestratorBuilder, PipelineRequest};
pub use errors::{LedgerError, PipelineError, RegistryError, RngError, StageError, ValidationError};
pub use ids::{ArtifactId, CohortHash, HypothesisId, Lag, RegistryHash, RunId, SnapshotId, StagePlanHash, VariableKey};
pub use ledger::{ArtifactFilters, InMemoryLedger, Ledger};
pub use model::{Artifact, ArtifactKind, ArtifactPayload};
pub use registry::{artifact_key, get_schema, validate_artifact, ArtifactRegistry, ArtifactSchema};
pub use rng::{derive_seed, DeterministicRng, RngPort};
pub use run::{compute_run_fingerprint, RunFingerprint, RunManifest};
pub use stage::{PipelineResult, PipelineSummary, StageContext, StageExecutor, StageKind, StageOutput, StagePlan,
                StageResult, StageSpec};
