//! Traits del ledger.
//!
//! La escritura (`LedgerWriter`) y la lectura (`LedgerReader`) están
//! separadas: el orquestador sólo escribe, las consultas y el replay sólo
//! leen. `Ledger` es la combinación de ambos. Todos los métodos toman
//! `&self` para que un mismo ledger se comparta entre corridas concurrentes.

use std::sync::Arc;

use crate::errors::LedgerError;
use crate::ids::{ArtifactId, RunId, VariableKey};
use crate::model::{Artifact, ArtifactKind, ArtifactPayload};
use crate::run::RunManifest;

/// Filtros de `list_artifacts`. `limit == 0` significa sin límite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactFilters {
    pub run_id: Option<RunId>,
    pub kind: Option<ArtifactKind>,
    pub var_keys: Vec<VariableKey>,
    pub limit: usize,
    pub offset: usize,
}

impl ArtifactFilters {
    pub fn for_run(run_id: RunId) -> Self {
        Self { run_id: Some(run_id),
               ..Self::default() }
    }

    pub fn with_kind(mut self, kind: ArtifactKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_var_key(mut self, key: impl Into<VariableKey>) -> Self {
        self.var_keys.push(key.into());
        self
    }

    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Filtros de kind y variables (el de run lo resuelve el ledger).
    pub fn matches(&self, artifact: &Artifact) -> bool {
        if self.kind.is_some_and(|k| k != artifact.kind) {
            return false;
        }
        if self.var_keys.is_empty() {
            return true;
        }
        let mentioned = mentioned_variables(&artifact.payload);
        self.var_keys.iter().any(|k| mentioned.contains(&k))
    }
}

/// Variables a las que hace referencia un payload.
fn mentioned_variables(payload: &ArtifactPayload) -> Vec<&VariableKey> {
    match payload {
        ArtifactPayload::Relationship(p) => vec![&p.key.variable_x, &p.key.variable_y],
        ArtifactPayload::SkippedRelationship(p) => vec![&p.key.variable_x, &p.key.variable_y],
        ArtifactPayload::VariableProfile(p) => vec![&p.variable_key],
        ArtifactPayload::VariableHealth(p) => vec![&p.variable_key],
        ArtifactPayload::Hypothesis(p) => vec![&p.cause_key, &p.effect_key],
        _ => Vec::new(),
    }
}

pub trait LedgerWriter: Send + Sync {
    /// Persiste un artifact bajo `run_id`. Nunca sobrescribe.
    fn store_artifact(&self, run_id: &RunId, artifact: Artifact) -> Result<(), LedgerError>;
}

pub trait LedgerReader: Send + Sync {
    fn get_artifact(&self, id: &ArtifactId) -> Result<Artifact, LedgerError>;

    /// Artifacts de una corrida en orden de escritura.
    fn artifacts_by_run(&self, run_id: &RunId) -> Result<Vec<Artifact>, LedgerError>;

    fn list_artifacts(&self, filters: &ArtifactFilters) -> Result<Vec<Artifact>, LedgerError>;

    fn artifacts_by_kind(&self, kind: ArtifactKind, limit: usize) -> Result<Vec<Artifact>, LedgerError> {
        self.list_artifacts(&ArtifactFilters::default().with_kind(kind).with_page(limit, 0))
    }

    fn run_manifest(&self, run_id: &RunId) -> Result<RunManifest, LedgerError>;
}

pub trait Ledger: LedgerWriter + LedgerReader {}

impl<T: LedgerWriter + LedgerReader + ?Sized> Ledger for T {}

impl<L: LedgerWriter + ?Sized> LedgerWriter for Arc<L> {
    fn store_artifact(&self, run_id: &RunId, artifact: Artifact) -> Result<(), LedgerError> {
        (**self).store_artifact(run_id, artifact)
    }
}

impl<L: LedgerReader + ?Sized> LedgerReader for Arc<L> {
    fn get_artifact(&self, id: &ArtifactId) -> Result<Artifact, LedgerError> {
        (**self).get_artifact(id)
    }

    fn artifacts_by_run(&self, run_id: &RunId) -> Result<Vec<Artifact>, LedgerError> {
        (**self).artifacts_by_run(run_id)
    }

    fn list_artifacts(&self, filters: &ArtifactFilters) -> Result<Vec<Artifact>, LedgerError> {
        (**self).list_artifacts(filters)
    }

    fn run_manifest(&self, run_id: &RunId) -> Result<RunManifest, LedgerError> {
        (**self).run_manifest(run_id)
    }
}
