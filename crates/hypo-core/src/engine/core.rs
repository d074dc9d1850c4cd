//! `Orchestrator`: ejecución secuencial de un `StagePlan` contra un manifest.
//!
//! Garantías:
//! - el manifest se valida y persiste antes de cualquier artifact de stage;
//! - los stages corren en el orden enviado, uno a la vez;
//! - todo artifact pasa por el registry y por un único camino de escritura;
//! - un error de stage es "soft" (queda en su `StageResult`), mientras que
//!   un fallo de validación de artifact, de ledger o una cancelación
//!   abortan la corrida sin rollback.

use chrono::Utc;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Instant;

use crate::dataset::MatrixBundle;
use crate::engine::builder::OrchestratorBuilder;
use crate::engine::cancel::CancellationFlag;
use crate::errors::{PipelineError, StageError, ValidationError};
use crate::ids::RunId;
use crate::ledger::Ledger;
use crate::model::{Artifact, ArtifactPayload};
use crate::registry::ArtifactRegistry;
use crate::run::RunManifest;
use crate::stage::{elapsed_ms, PipelineResult, RunPhase, StageContext, StageExecutionAudit, StageExecutor, StageKind,
                   StageMetrics, StagePlan, StageResult, StageSpec};

/// Pedido de ejecución de un pipeline.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub run_id: RunId,
    pub bundle: MatrixBundle,
    pub plan: StagePlan,
    pub cancel: CancellationFlag,
}

impl PipelineRequest {
    pub fn new(run_id: RunId, bundle: MatrixBundle, plan: StagePlan) -> Self {
        Self { run_id,
               bundle,
               plan,
               cancel: CancellationFlag::new() }
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

pub struct Orchestrator<L: Ledger> {
    ledger: L,
    registry: ArtifactRegistry,
    executors: HashMap<StageKind, Box<dyn StageExecutor>>,
    phases: DashMap<RunId, RunPhase>,
}

impl<L: Ledger> fmt::Debug for Orchestrator<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&StageKind> = self.executors.keys().collect();
        kinds.sort();
        f.debug_struct("Orchestrator")
         .field("registry", &self.registry)
         .field("executors", &kinds)
         .finish()
    }
}

impl<L: Ledger> Orchestrator<L> {
    #[inline]
    pub fn builder(ledger: L) -> OrchestratorBuilder<L> {
        OrchestratorBuilder::new(ledger)
    }

    pub(crate) fn from_parts(ledger: L,
                             registry: ArtifactRegistry,
                             executors: HashMap<StageKind, Box<dyn StageExecutor>>)
                             -> Self {
        Self { ledger,
               registry,
               executors,
               phases: DashMap::new() }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    /// Última fase conocida de una corrida ejecutada por este orquestador.
    pub fn run_phase(&self, run_id: &RunId) -> Option<RunPhase> {
        self.phases.get(run_id).map(|p| *p)
    }

    fn set_phase(&self, run_id: &RunId, next: RunPhase) {
        let previous = self.phases.insert(run_id.clone(), next);
        if let Some(prev) = previous.filter(|p| !p.can_transition_to(next) && next != RunPhase::ManifestPending) {
            warn!("run_phase:unexpected_transition run_id={run_id} from={prev:?} to={next:?}");
        }
        debug!("run_phase run_id={run_id} phase={next:?}");
    }

    fn abort(&self, run_id: &RunId, err: PipelineError) -> PipelineError {
        let phase = match err {
            PipelineError::Cancelled { .. } => RunPhase::Cancelled,
            _ => RunPhase::Failed,
        };
        self.set_phase(run_id, phase);
        error!("execute_pipeline:abort run_id={run_id} err={err}");
        err
    }

    /// Ejecuta el plan del pedido contra el manifest.
    ///
    /// El manifest debe corresponder a la corrida del pedido y haber sido
    /// construido con el mismo plan (se compara el hash del plan).
    pub fn execute_pipeline(&self,
                            request: &PipelineRequest,
                            manifest: &RunManifest)
                            -> Result<PipelineResult, PipelineError> {
        let run_id = &request.run_id;
        info!("execute_pipeline:start run_id={run_id} stages={} fingerprint={}",
              request.plan.len(),
              manifest.fingerprint);
        self.set_phase(run_id, RunPhase::ManifestPending);

        self.check_inputs(request, manifest).map_err(|e| self.abort(run_id, e))?;

        self.persist(run_id, manifest.to_artifact(), "failed to store run manifest")
            .map_err(|e| self.abort(run_id, e))?;
        self.set_phase(run_id, RunPhase::ManifestStored);

        self.set_phase(run_id, RunPhase::StagesExecuting);
        let mut result = PipelineResult::new(request.plan.clone());
        for (completed, spec) in request.plan.stages.iter().enumerate() {
            if request.cancel.is_cancelled() {
                warn!("execute_pipeline:cancelled run_id={run_id} before_stage={}", spec.name);
                return Err(self.abort(run_id,
                                      PipelineError::Cancelled { run_id: run_id.clone(),
                                                                 completed_stages: completed }));
            }
            let stage_result = self.run_stage(request, manifest, spec, completed)
                                   .map_err(|e| self.abort(run_id, e))?;
            result.add_result(stage_result);
        }

        self.set_phase(run_id, RunPhase::Completed);
        info!("execute_pipeline:done run_id={run_id} successful={} failed={} artifacts={} duration_ms={}",
              result.overall.successful,
              result.overall.failed,
              result.overall.artifacts_count,
              result.overall.total_duration_ms);
        Ok(result)
    }

    fn check_inputs(&self, request: &PipelineRequest, manifest: &RunManifest) -> Result<(), PipelineError> {
        manifest.validate().map_err(PipelineError::InvalidManifest)?;
        if manifest.run_id != request.run_id {
            return Err(PipelineError::InvalidManifest(ValidationError::new("run_manifest",
                                                                           format!("run_id {} does not match request run_id {}",
                                                                                   manifest.run_id, request.run_id))));
        }
        request.plan.validate().map_err(PipelineError::InvalidPlan)?;
        if request.plan.hash() != manifest.stage_plan_hash {
            return Err(PipelineError::InvalidPlan(ValidationError::new("stage_plan",
                                                                       "hash does not match run manifest")));
        }
        Ok(())
    }

    fn run_stage(&self,
                 request: &PipelineRequest,
                 manifest: &RunManifest,
                 spec: &StageSpec,
                 completed: usize)
                 -> Result<StageResult, PipelineError> {
        let run_id = &request.run_id;
        let started = Instant::now();
        let executed_at = Utc::now();
        debug!("run_stage:start run_id={run_id} stage={} kind={}", spec.name, spec.kind);

        let ctx = StageContext { run_id,
                                 manifest,
                                 bundle: &request.bundle,
                                 spec,
                                 cancel: &request.cancel };
        let outcome = match self.executors.get(&spec.kind) {
            Some(executor) => executor.execute(&ctx),
            None => Err(StageError::UnsupportedKind(spec.kind)),
        };

        let mut audit = StageExecutionAudit { stage_name: spec.name.clone(),
                                              run_id: run_id.clone(),
                                              snapshot_id: manifest.snapshot_id.clone(),
                                              seed: manifest.seed,
                                              artifacts_written: 0,
                                              skips_by_reason: BTreeMap::new(),
                                              warnings: Vec::new(),
                                              executed_at };

        let output = match outcome {
            Ok(output) => output,
            // cancelación dentro del stage: fatal como en el borde entre stages
            Err(StageError::Cancelled) => {
                warn!("run_stage:cancelled run_id={run_id} stage={}", spec.name);
                return Err(PipelineError::Cancelled { run_id: run_id.clone(),
                                                      completed_stages: completed });
            }
            Err(e) => {
                let duration_ms = elapsed_ms(started);
                warn!("run_stage:failed run_id={run_id} stage={} err={e}", spec.name);
                return Ok(StageResult { stage_name: spec.name.clone(),
                                        success: false,
                                        metrics: StageMetrics { duration_ms,
                                                                ..StageMetrics::default() },
                                        artifacts: Vec::new(),
                                        audit,
                                        error: Some(e.to_string()),
                                        duration_ms });
            }
        };

        let context = format!("failed to store artifact for stage {}", spec.name);
        for artifact in &output.artifacts {
            self.persist_stage_artifact(run_id, artifact.clone(), &context)?;
        }
        audit.artifacts_written = output.artifacts.len();
        audit.skips_by_reason = skips_by_reason(&output.artifacts);
        audit.warnings = output.warnings;

        let duration_ms = elapsed_ms(started);
        let mut metrics = output.metrics;
        metrics.duration_ms = duration_ms;
        debug!("run_stage:ok run_id={run_id} stage={} artifacts={} duration_ms={duration_ms}",
               spec.name,
               audit.artifacts_written);
        Ok(StageResult { stage_name: spec.name.clone(),
                         success: true,
                         metrics,
                         artifacts: output.artifacts,
                         audit,
                         error: None,
                         duration_ms })
    }

    fn persist_stage_artifact(&self, run_id: &RunId, artifact: Artifact, context: &str) -> Result<(), PipelineError> {
        match self.run_phase(run_id) {
            Some(RunPhase::ManifestStored | RunPhase::StagesExecuting) => self.persist(run_id, artifact, context),
            _ => Err(PipelineError::ManifestNotStored(run_id.clone())),
        }
    }

    /// Único camino de escritura: valida contra el registry y persiste.
    fn persist(&self, run_id: &RunId, artifact: Artifact, context: &str) -> Result<(), PipelineError> {
        self.registry
            .validate_artifact(&artifact)
            .map_err(|source| PipelineError::ArtifactValidation { artifact_id: artifact.id.to_string(),
                                                                  source })?;
        let key = self.registry
                      .artifact_key(&artifact)
                      .map_err(|source| PipelineError::ArtifactValidation { artifact_id: artifact.id.to_string(),
                                                                            source })?;
        debug!("persist run_id={run_id} kind={} key={key}", artifact.kind);
        self.ledger
            .store_artifact(run_id, artifact)
            .map_err(|source| PipelineError::LedgerWrite { context: context.to_string(),
                                                           source })
    }
}

/// Conteo de skips por código de motivo.
fn skips_by_reason(artifacts: &[Artifact]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for artifact in artifacts {
        if let ArtifactPayload::SkippedRelationship(p) = &artifact.payload {
            *counts.entry(p.reason_code.to_string()).or_insert(0) += 1;
        }
    }
    counts
}
