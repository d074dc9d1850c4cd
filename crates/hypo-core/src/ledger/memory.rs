//! Ledger en memoria respaldado por `DashMap`.
//!
//! Aplica el gate manifest-first por corrida: el primer artifact de un
//! `run_id` debe ser su `RunManifest` y sólo puede haber uno.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::LedgerError;
use crate::ids::{ArtifactId, RunId};
use crate::ledger::store::{ArtifactFilters, LedgerReader, LedgerWriter};
use crate::model::{Artifact, ArtifactKind};
use crate::run::RunManifest;

#[derive(Debug, Clone)]
struct StoredArtifact {
    seq: u64,
    run_id: RunId,
    artifact: Artifact,
}

#[derive(Debug, Default)]
struct RunEntry {
    manifest: Option<ArtifactId>,
    artifacts: Vec<ArtifactId>,
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    artifacts: DashMap<ArtifactId, StoredArtifact>,
    runs: DashMap<RunId, RunEntry>,
    seq: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    fn sorted_stored(&self) -> Vec<StoredArtifact> {
        let mut all: Vec<StoredArtifact> = self.artifacts.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|s| s.seq);
        all
    }
}

impl LedgerWriter for InMemoryLedger {
    fn store_artifact(&self, run_id: &RunId, artifact: Artifact) -> Result<(), LedgerError> {
        // El guard de la entrada serializa las escrituras de una misma corrida.
        let mut run = self.runs.entry(run_id.clone()).or_default();
        if artifact.kind == ArtifactKind::Run {
            if run.manifest.is_some() {
                return Err(LedgerError::ManifestAlreadyStored(run_id.clone()));
            }
            let manifest =
                artifact.as_run_manifest()
                        .ok_or_else(|| LedgerError::Backend(format!("run artifact {} has no manifest payload", artifact.id)))?;
            if &manifest.run_id != run_id {
                return Err(LedgerError::RunMismatch { run_id: run_id.clone(),
                                                      manifest_run: manifest.run_id.clone() });
            }
        } else if run.manifest.is_none() {
            return Err(LedgerError::ManifestMissing(run_id.clone()));
        }

        let id = artifact.id.clone();
        let kind = artifact.kind;
        match self.artifacts.entry(id.clone()) {
            Entry::Occupied(_) => return Err(LedgerError::DuplicateArtifact(id.to_string())),
            Entry::Vacant(slot) => {
                let seq = self.seq.fetch_add(1, Ordering::SeqCst);
                slot.insert(StoredArtifact { seq,
                                             run_id: run_id.clone(),
                                             artifact });
            }
        }
        if kind == ArtifactKind::Run {
            run.manifest = Some(id.clone());
        }
        run.artifacts.push(id.clone());
        debug!("store_artifact:ok run_id={run_id} artifact_id={id} kind={kind}");
        Ok(())
    }
}

impl LedgerReader for InMemoryLedger {
    fn get_artifact(&self, id: &ArtifactId) -> Result<Artifact, LedgerError> {
        self.artifacts
            .get(id)
            .map(|s| s.artifact.clone())
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    fn artifacts_by_run(&self, run_id: &RunId) -> Result<Vec<Artifact>, LedgerError> {
        let ids = match self.runs.get(run_id) {
            Some(run) => run.artifacts.clone(),
            None => return Ok(Vec::new()),
        };
        ids.iter().map(|id| self.get_artifact(id)).collect()
    }

    fn list_artifacts(&self, filters: &ArtifactFilters) -> Result<Vec<Artifact>, LedgerError> {
        let limit = if filters.limit == 0 { usize::MAX } else { filters.limit };
        Ok(self.sorted_stored()
               .into_iter()
               .filter(|s| filters.run_id.as_ref().map_or(true, |r| r == &s.run_id))
               .filter(|s| filters.matches(&s.artifact))
               .skip(filters.offset)
               .take(limit)
               .map(|s| s.artifact)
               .collect())
    }

    fn run_manifest(&self, run_id: &RunId) -> Result<RunManifest, LedgerError> {
        let id = self.runs
                     .get(run_id)
                     .and_then(|r| r.manifest.clone())
                     .ok_or_else(|| LedgerError::NotFound(format!("run_manifest:{run_id}")))?;
        let artifact = self.get_artifact(&id)?;
        artifact.as_run_manifest()
                .cloned()
                .ok_or_else(|| LedgerError::Backend(format!("artifact {id} is not a run manifest")))
    }
}
