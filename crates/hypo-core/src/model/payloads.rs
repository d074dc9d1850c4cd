//! Payloads tipados por kind.
//!
//! Las estructuras se serializan planas (los bloques `key`/`metrics` usan
//! `flatten`) para que el JSON de un relationship sea el mismo que consumen
//! los lectores del ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::hashing::hash_str;
use crate::ids::{CohortHash, HypothesisId, RegistryHash, RunId, SnapshotId, StagePlanHash, VariableKey};
use crate::model::verdict::ValidationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    #[default]
    Pearson,
    Spearman,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Pearson => "pearson",
            TestType::Spearman => "spearman",
        }
    }

    /// Parseo tolerante a mayúsculas; `None` para tests no soportados.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Some(TestType::Pearson),
            "spearman" => Some(TestType::Spearman),
            _ => None,
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Códigos estructurados de warning / motivo de skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    PerfectCorrelation,
    LowVariance,
    LikelyDerived,
    LowN,
    HighMissing,
    SparseData,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::PerfectCorrelation => "PERFECT_CORRELATION",
            WarningCode::LowVariance => "LOW_VARIANCE",
            WarningCode::LikelyDerived => "LIKELY_DERIVED",
            WarningCode::LowN => "LOW_N",
            WarningCode::HighMissing => "HIGH_MISSING",
            WarningCode::SparseData => "SPARSE_DATA",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identidad de una relación entre dos variables dentro de una familia FDR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipKey {
    pub variable_x: VariableKey,
    pub variable_y: VariableKey,
    pub test_type: TestType,
    pub family_id: String,
}

impl RelationshipKey {
    /// Par (menor, mayor) en orden lexicográfico. Base de la stable key.
    pub fn canonical_pair(&self) -> (&VariableKey, &VariableKey) {
        if self.variable_x <= self.variable_y {
            (&self.variable_x, &self.variable_y)
        } else {
            (&self.variable_y, &self.variable_x)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalMetrics {
    pub effect_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_unit: Option<String>,
    pub p_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_value: Option<f64>,
    pub sample_size: usize,
    pub total_comparisons: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fdr_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataQuality {
    pub missing_rate_x: f64,
    pub missing_rate_y: f64,
    pub unique_count_x: usize,
    pub unique_count_y: usize,
    pub variance_x: f64,
    pub variance_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipPayload {
    #[serde(flatten)]
    pub key: RelationshipKey,
    #[serde(flatten)]
    pub metrics: CanonicalMetrics,
    pub data_quality: DataQuality,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<WarningCode>,
    pub fingerprint: String,
    pub discovered_at: DateTime<Utc>,
}

/// Par de variables que no se testeó, con el motivo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRelationshipPayload {
    pub key: RelationshipKey,
    pub reason_code: WarningCode,
    #[serde(default)]
    pub counts: BTreeMap<String, usize>,
    pub data_quality: DataQuality,
    pub first_seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepManifestPayload {
    pub sweep_id: String,
    pub run_id: RunId,
    pub snapshot_id: SnapshotId,
    pub registry_hash: RegistryHash,
    pub cohort_hash: CohortHash,
    pub stage_plan_hash: StagePlanHash,
    pub seed: i64,
    pub tests_executed: Vec<TestType>,
    pub runtime_ms: u64,
    pub total_comparisons: usize,
    pub successful_tests: usize,
    pub skipped_tests: usize,
    pub rejection_counts: BTreeMap<WarningCode, usize>,
    pub artifact_counts: BTreeMap<String, usize>,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Criterio de agrupación de una familia de tests para la corrección FDR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FamilyKey {
    pub snapshot_id: SnapshotId,
    pub cohort_hash: CohortHash,
    pub stage_name: String,
    pub test_type: TestType,
    pub registry_hash: RegistryHash,
    pub stage_plan_hash: StagePlanHash,
}

impl FamilyKey {
    /// Id determinista de la familia (SHA-256 de los seis componentes).
    pub fn family_id(&self) -> String {
        hash_str(&format!("{}|{}|{}|{}|{}|{}",
                          self.snapshot_id,
                          self.cohort_hash,
                          self.stage_name,
                          self.test_type,
                          self.registry_hash,
                          self.stage_plan_hash))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FdrFamilyPayload {
    pub family_id: String,
    pub family_key: FamilyKey,
    pub num_tests: usize,
    pub fdr_method: String,
    pub created_at: DateTime<Utc>,
}

impl FdrFamilyPayload {
    pub fn new(family_key: FamilyKey, num_tests: usize, fdr_method: impl Into<String>) -> Self {
        Self { family_id: family_key.family_id(),
               family_key,
               num_tests,
               fdr_method: fdr_method.into(),
               created_at: Utc::now() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableProfilePayload {
    pub variable_key: VariableKey,
    pub sample_size: usize,
    pub missing_rate: f64,
    pub variance: f64,
    pub cardinality: usize,
    pub zero_variance: bool,
    pub high_cardinality: bool,
    pub profiled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unusable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableHealthPayload {
    pub variable_key: VariableKey,
    pub status: HealthStatus,
    pub missing_rate: f64,
    #[serde(default)]
    pub issues: Vec<WarningCode>,
    pub assessed_at: DateTime<Utc>,
}

/// Hipótesis causa → efecto junto al veredicto del referee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisPayload {
    pub hypothesis_id: HypothesisId,
    pub cause_key: VariableKey,
    pub effect_key: VariableKey,
    pub validation: ValidationResult,
}
