//! `RunManifest`: fuente de verdad para el replay de una corrida.
//!
//! Debe ser el primer artifact persistido de cada `run_id`; el ledger
//! rechaza artifacts de stage para corridas sin manifest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::ids::{CohortHash, Lag, RegistryHash, RunId, SnapshotId, StagePlanHash};
use crate::model::{Artifact, ArtifactKind, ArtifactPayload};
use crate::run::fingerprint::{compute_run_fingerprint, RunFingerprint};
use crate::stage::StagePlan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub snapshot_id: SnapshotId,
    pub snapshot_at: DateTime<Utc>,
    pub lag: Lag,
    pub cutoff_at: DateTime<Utc>,
    pub registry_hash: RegistryHash,
    pub cohort_hash: CohortHash,
    pub stage_plan_hash: StagePlanHash,
    pub seed: i64,
    pub code_version: String,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

impl RunManifest {
    /// Construye el manifest calculando el hash del plan y el fingerprint.
    #[allow(clippy::too_many_arguments)]
    pub fn new(run_id: RunId,
               snapshot_id: SnapshotId,
               snapshot_at: DateTime<Utc>,
               lag: Lag,
               cutoff_at: DateTime<Utc>,
               registry_hash: RegistryHash,
               cohort_hash: CohortHash,
               stage_plan: &StagePlan,
               seed: i64,
               code_version: impl Into<String>)
               -> Self {
        let code_version = code_version.into();
        let stage_plan_hash = stage_plan.hash();
        let fingerprint = compute_run_fingerprint(&snapshot_id,
                                                  &registry_hash,
                                                  &cohort_hash,
                                                  &stage_plan_hash,
                                                  seed,
                                                  &code_version);
        Self { run_id,
               snapshot_id,
               snapshot_at,
               lag,
               cutoff_at,
               registry_hash,
               cohort_hash,
               stage_plan_hash,
               seed,
               code_version,
               fingerprint,
               created_at: Utc::now() }
    }

    /// Campos obligatorios. Seed 0 es válido.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [("run_id", self.run_id.is_empty()),
                        ("snapshot_id", self.snapshot_id.is_empty()),
                        ("registry_hash", self.registry_hash.is_empty()),
                        ("cohort_hash", self.cohort_hash.is_empty()),
                        ("code_version", self.code_version.trim().is_empty())];
        match required.iter().find(|(_, missing)| *missing) {
            Some((field, _)) => Err(ValidationError::new("run_manifest", format!("{field} cannot be empty"))),
            None => Ok(()),
        }
    }

    /// Recalcula el fingerprint desde las entradas guardadas.
    pub fn recompute_fingerprint(&self) -> String {
        compute_run_fingerprint(&self.snapshot_id,
                                &self.registry_hash,
                                &self.cohort_hash,
                                &self.stage_plan_hash,
                                self.seed,
                                &self.code_version)
    }

    /// `true` si el fingerprint almacenado corresponde a las entradas.
    pub fn verify_fingerprint(&self) -> bool {
        self.recompute_fingerprint() == self.fingerprint
    }

    pub fn run_fingerprint(&self) -> RunFingerprint {
        RunFingerprint::new(self.snapshot_id.clone(),
                            self.registry_hash.clone(),
                            self.cohort_hash.clone(),
                            self.stage_plan_hash.clone(),
                            self.seed,
                            self.code_version.clone())
    }

    /// Envuelve el manifest en un artifact `Run` con id nuevo.
    pub fn to_artifact(&self) -> Artifact {
        let mut artifact = Artifact::with_kind(ArtifactKind::Run, ArtifactPayload::Run(self.clone()));
        artifact.created_at = self.created_at;
        artifact
    }
}
