//! Artifact: unidad append-only del ledger.
//!
//! El payload es una unión cerrada (`ArtifactPayload`) con una variante por
//! `ArtifactKind`. El kind declarado del artifact se guarda aparte para que
//! el registry pueda detectar inconsistencias (kind declarado distinto al
//! del payload) antes de persistir.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::hashing::hash_value;
use crate::ids::ArtifactId;
use crate::model::payloads::{FdrFamilyPayload, HypothesisPayload, RelationshipPayload, SkippedRelationshipPayload,
                             SweepManifestPayload, VariableHealthPayload, VariableProfilePayload};
use crate::run::RunManifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Relationship,
    SkippedRelationship,
    SweepManifest,
    Run,
    FdrFamily,
    VariableProfile,
    VariableHealth,
    Hypothesis,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 8] = [ArtifactKind::Relationship,
                                        ArtifactKind::SkippedRelationship,
                                        ArtifactKind::SweepManifest,
                                        ArtifactKind::Run,
                                        ArtifactKind::FdrFamily,
                                        ArtifactKind::VariableProfile,
                                        ArtifactKind::VariableHealth,
                                        ArtifactKind::Hypothesis];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Relationship => "relationship",
            ArtifactKind::SkippedRelationship => "skipped_relationship",
            ArtifactKind::SweepManifest => "sweep_manifest",
            ArtifactKind::Run => "run",
            ArtifactKind::FdrFamily => "fdr_family",
            ArtifactKind::VariableProfile => "variable_profile",
            ArtifactKind::VariableHealth => "variable_health",
            ArtifactKind::Hypothesis => "hypothesis",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload sin forma fija para extensiones. Se valida sólo a nivel de kind
/// y exige que `body` sea un objeto JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericPayload {
    pub kind: ArtifactKind,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ArtifactPayload {
    Relationship(RelationshipPayload),
    SkippedRelationship(SkippedRelationshipPayload),
    SweepManifest(SweepManifestPayload),
    Run(RunManifest),
    FdrFamily(FdrFamilyPayload),
    VariableProfile(VariableProfilePayload),
    VariableHealth(VariableHealthPayload),
    Hypothesis(HypothesisPayload),
    Generic(GenericPayload),
}

impl ArtifactPayload {
    /// Kind que corresponde estructuralmente a este payload.
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactPayload::Relationship(_) => ArtifactKind::Relationship,
            ArtifactPayload::SkippedRelationship(_) => ArtifactKind::SkippedRelationship,
            ArtifactPayload::SweepManifest(_) => ArtifactKind::SweepManifest,
            ArtifactPayload::Run(_) => ArtifactKind::Run,
            ArtifactPayload::FdrFamily(_) => ArtifactKind::FdrFamily,
            ArtifactPayload::VariableProfile(_) => ArtifactKind::VariableProfile,
            ArtifactPayload::VariableHealth(_) => ArtifactKind::VariableHealth,
            ArtifactPayload::Hypothesis(_) => ArtifactKind::Hypothesis,
            ArtifactPayload::Generic(g) => g.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub kind: ArtifactKind,
    pub payload: ArtifactPayload,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Crea un artifact con id UUID v7 y kind derivado del payload.
    pub fn new(payload: ArtifactPayload) -> Self {
        Self { id: ArtifactId::generate(),
               kind: payload.kind(),
               payload,
               created_at: Utc::now() }
    }

    /// Crea un artifact con kind declarado explícito. El registry rechaza
    /// el artifact si no coincide con el payload.
    pub fn with_kind(kind: ArtifactKind, payload: ArtifactPayload) -> Self {
        Self { id: ArtifactId::generate(),
               kind,
               payload,
               created_at: Utc::now() }
    }

    pub fn with_id(mut self, id: impl Into<ArtifactId>) -> Self {
        self.id = id.into();
        self
    }

    /// Hash SHA-256 del JSON canónico del payload.
    pub fn content_hash(&self) -> Option<String> {
        hash_value(&self.payload)
    }

    pub fn as_run_manifest(&self) -> Option<&RunManifest> {
        match &self.payload {
            ArtifactPayload::Run(m) => Some(m),
            _ => None,
        }
    }
}
