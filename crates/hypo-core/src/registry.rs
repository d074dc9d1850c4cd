//! Registry de schemas de artifacts.
//!
//! Única fuente de verdad sobre qué es un artifact bien formado de un kind y
//! cómo se deriva su stable key (clave de deduplicación). Las funciones
//! libres operan sobre el registry estándar; el orquestador puede recibir uno
//! propio vía builder.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

use crate::constants::{KEY_SEPARATOR, SCHEMA_VERSION};
use crate::errors::RegistryError;
use crate::model::{Artifact, ArtifactKind, ArtifactPayload, RelationshipKey};

pub type KeyFn = fn(&Artifact) -> String;
pub type ValidateFn = fn(&Artifact) -> Result<(), String>;

#[derive(Clone, Copy)]
pub struct ArtifactSchema {
    pub kind: ArtifactKind,
    pub schema_version: &'static str,
    pub key_fn: KeyFn,
    pub validate_fn: ValidateFn,
}

impl ArtifactSchema {
    pub fn new(kind: ArtifactKind, key_fn: KeyFn, validate_fn: ValidateFn) -> Self {
        Self { kind,
               schema_version: SCHEMA_VERSION,
               key_fn,
               validate_fn }
    }
}

impl fmt::Debug for ArtifactSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactSchema")
         .field("kind", &self.kind)
         .field("schema_version", &self.schema_version)
         .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    schemas: HashMap<ArtifactKind, ArtifactSchema>,
}

impl ArtifactRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry con los ocho kinds conocidos.
    pub fn standard() -> Self {
        let mut r = Self::empty();
        r.register(ArtifactSchema::new(ArtifactKind::Relationship, relationship_key, validate_relationship));
        r.register(ArtifactSchema::new(ArtifactKind::SkippedRelationship,
                                       skipped_relationship_key,
                                       validate_skipped_relationship));
        r.register(ArtifactSchema::new(ArtifactKind::SweepManifest, sweep_manifest_key, validate_sweep_manifest));
        r.register(ArtifactSchema::new(ArtifactKind::Run, run_manifest_key, validate_run_manifest));
        r.register(ArtifactSchema::new(ArtifactKind::FdrFamily, fdr_family_key, validate_fdr_family));
        r.register(ArtifactSchema::new(ArtifactKind::VariableProfile, variable_profile_key, validate_variable_profile));
        r.register(ArtifactSchema::new(ArtifactKind::VariableHealth, id_key, validate_variable_health));
        r.register(ArtifactSchema::new(ArtifactKind::Hypothesis, id_key, validate_hypothesis));
        r
    }

    /// Registra (o reemplaza) el schema de un kind. Devuelve el anterior.
    pub fn register(&mut self, schema: ArtifactSchema) -> Option<ArtifactSchema> {
        self.schemas.insert(schema.kind, schema)
    }

    pub fn get_schema(&self, kind: ArtifactKind) -> Result<&ArtifactSchema, RegistryError> {
        self.schemas.get(&kind).ok_or(RegistryError::UnknownArtifactKind(kind))
    }

    /// Valida el artifact contra el schema de su kind declarado.
    ///
    /// Además de las reglas propias del kind se exige que el payload sea del
    /// mismo kind que el declarado y que el id no esté vacío.
    pub fn validate_artifact(&self, artifact: &Artifact) -> Result<(), RegistryError> {
        let schema = self.get_schema(artifact.kind)?;
        let fail = |reason: String| RegistryError::ArtifactValidation { artifact_id: artifact.id.to_string(),
                                                                        kind: artifact.kind,
                                                                        reason };
        let payload_kind = artifact.payload.kind();
        if payload_kind != schema.kind {
            return Err(fail(format!("expected kind {}, got payload of kind {}", schema.kind, payload_kind)));
        }
        if artifact.id.is_empty() {
            return Err(fail(format!("{} artifact missing ID", schema.kind)));
        }
        if let ArtifactPayload::Generic(g) = &artifact.payload {
            if !g.body.is_object() {
                return Err(fail("generic payload body must be a JSON object".to_string()));
            }
            return Ok(());
        }
        (schema.validate_fn)(artifact).map_err(fail)
    }

    pub fn artifact_key(&self, artifact: &Artifact) -> Result<String, RegistryError> {
        let schema = self.get_schema(artifact.kind)?;
        Ok((schema.key_fn)(artifact))
    }

    pub fn kinds(&self) -> Vec<ArtifactKind> {
        let mut kinds: Vec<ArtifactKind> = self.schemas.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

static REGISTRY: Lazy<ArtifactRegistry> = Lazy::new(ArtifactRegistry::standard);

/// Acceso al registry estándar compartido.
pub fn standard_registry() -> &'static ArtifactRegistry {
    &REGISTRY
}

pub fn get_schema(kind: ArtifactKind) -> Result<&'static ArtifactSchema, RegistryError> {
    REGISTRY.get_schema(kind)
}

pub fn validate_artifact(artifact: &Artifact) -> Result<(), RegistryError> {
    REGISTRY.validate_artifact(artifact)
}

pub fn artifact_key(artifact: &Artifact) -> Result<String, RegistryError> {
    REGISTRY.artifact_key(artifact)
}

// ----------------------------------------------------------------------------
// Key functions
// ----------------------------------------------------------------------------

fn join_key(parts: &[&str]) -> String {
    parts.join(&KEY_SEPARATOR.to_string())
}

fn pair_key(kind: ArtifactKind, key: &RelationshipKey) -> String {
    let (low, high) = key.canonical_pair();
    join_key(&[kind.as_str(), key.test_type.as_str(), &key.family_id, low.as_str(), high.as_str()])
}

/// Campo string no vacío del body de un payload genérico.
fn generic_field<'a>(artifact: &'a Artifact, field: &str) -> Option<&'a str> {
    match &artifact.payload {
        ArtifactPayload::Generic(g) => g.body.get(field).and_then(|v| v.as_str()).filter(|s| !s.trim().is_empty()),
        _ => None,
    }
}

fn business_key(prefix: &str, id: Option<&str>, artifact: &Artifact) -> String {
    match id.filter(|s| !s.trim().is_empty()) {
        Some(id) => join_key(&[prefix, id]),
        None => artifact.id.to_string(),
    }
}

fn id_key(artifact: &Artifact) -> String {
    artifact.id.to_string()
}

fn relationship_key(artifact: &Artifact) -> String {
    match &artifact.payload {
        ArtifactPayload::Relationship(p) => pair_key(ArtifactKind::Relationship, &p.key),
        _ => artifact.id.to_string(),
    }
}

fn skipped_relationship_key(artifact: &Artifact) -> String {
    match &artifact.payload {
        ArtifactPayload::SkippedRelationship(p) => pair_key(ArtifactKind::SkippedRelationship, &p.key),
        _ => artifact.id.to_string(),
    }
}

fn sweep_manifest_key(artifact: &Artifact) -> String {
    let id = match &artifact.payload {
        ArtifactPayload::SweepManifest(p) => Some(p.sweep_id.as_str()),
        _ => generic_field(artifact, "sweep_id"),
    };
    business_key("sweep_manifest", id, artifact)
}

fn fdr_family_key(artifact: &Artifact) -> String {
    let id = match &artifact.payload {
        ArtifactPayload::FdrFamily(p) => Some(p.family_id.as_str()),
        _ => generic_field(artifact, "family_id"),
    };
    business_key("fdr_family", id, artifact)
}

fn variable_profile_key(artifact: &Artifact) -> String {
    let id = match &artifact.payload {
        ArtifactPayload::VariableProfile(p) => Some(p.variable_key.as_str()),
        _ => generic_field(artifact, "variable_key"),
    };
    business_key("variable_profile", id, artifact)
}

fn run_manifest_key(artifact: &Artifact) -> String {
    let id = match &artifact.payload {
        ArtifactPayload::Run(m) => Some(m.run_id.as_str()),
        _ => generic_field(artifact, "run_id"),
    };
    business_key("run_manifest", id, artifact)
}

// ----------------------------------------------------------------------------
// Validators (el envelope ya fue chequeado en `validate_artifact`)
// ----------------------------------------------------------------------------

fn check_pair(key: &RelationshipKey) -> Result<(), String> {
    if key.variable_x.is_empty() || key.variable_y.is_empty() {
        return Err("variable_x and variable_y must be set".to_string());
    }
    Ok(())
}

fn validate_relationship(artifact: &Artifact) -> Result<(), String> {
    let ArtifactPayload::Relationship(p) = &artifact.payload else {
        return Ok(());
    };
    check_pair(&p.key)?;
    if p.key.family_id.trim().is_empty() {
        return Err("family_id must be set".to_string());
    }
    if p.metrics.sample_size == 0 {
        return Err("sample_size must be > 0".to_string());
    }
    if !(0.0..=1.0).contains(&p.metrics.p_value) {
        return Err(format!("p_value must be in [0, 1], got {}", p.metrics.p_value));
    }
    Ok(())
}

fn validate_skipped_relationship(artifact: &Artifact) -> Result<(), String> {
    match &artifact.payload {
        ArtifactPayload::SkippedRelationship(p) => check_pair(&p.key),
        _ => Ok(()),
    }
}

fn validate_sweep_manifest(artifact: &Artifact) -> Result<(), String> {
    match &artifact.payload {
        ArtifactPayload::SweepManifest(p) if p.snapshot_id.is_empty() => Err("snapshot_id must be set".to_string()),
        _ => Ok(()),
    }
}

fn validate_run_manifest(artifact: &Artifact) -> Result<(), String> {
    let ArtifactPayload::Run(m) = &artifact.payload else {
        return Ok(());
    };
    m.validate().map_err(|e| e.to_string())?;
    if m.fingerprint.trim().is_empty() {
        return Err("fingerprint must be set".to_string());
    }
    Ok(())
}

fn validate_fdr_family(artifact: &Artifact) -> Result<(), String> {
    match &artifact.payload {
        ArtifactPayload::FdrFamily(p) if p.fdr_method.trim().is_empty() => Err("fdr_method must be set".to_string()),
        _ => Ok(()),
    }
}

fn validate_variable_profile(artifact: &Artifact) -> Result<(), String> {
    match &artifact.payload {
        ArtifactPayload::VariableProfile(p) if !(0.0..=1.0).contains(&p.missing_rate) => {
            Err(format!("missing_rate must be in [0, 1], got {}", p.missing_rate))
        }
        _ => Ok(()),
    }
}

fn validate_variable_health(artifact: &Artifact) -> Result<(), String> {
    match &artifact.payload {
        ArtifactPayload::VariableHealth(p) if p.variable_key.is_empty() => Err("variable_key must be set".to_string()),
        _ => Ok(()),
    }
}

fn validate_hypothesis(artifact: &Artifact) -> Result<(), String> {
    let ArtifactPayload::Hypothesis(p) = &artifact.payload else {
        return Ok(());
    };
    if p.hypothesis_id.is_empty() {
        return Err("hypothesis_id must be set".to_string());
    }
    if p.cause_key.is_empty() || p.effect_key.is_empty() {
        return Err("cause_key and effect_key must be set".to_string());
    }
    if !p.validation.is_consistent() {
        return Err("falsification_log must be present iff status is rejected".to_string());
    }
    Ok(())
}
